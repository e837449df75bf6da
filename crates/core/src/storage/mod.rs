//! SQLite storage layer for plaza-world accounts and stats

mod migrations;
mod parse;
mod stats;
mod traits;
mod users;

use std::path::Path;

use rusqlite::Connection;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Account, PlayerStats};

pub use stats::StatsStore;
pub use traits::{AccountRepository, StatsRepository, Storage};
pub use users::UserStore;

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    /// Get account store
    pub fn users(&self) -> UserStore<'_> {
        UserStore::new(&self.conn)
    }

    /// Get stats store
    pub fn stats(&self) -> StatsStore<'_> {
        StatsStore::new(&self.conn)
    }
}

impl AccountRepository for Database {
    fn create_account(&self, account: &Account) -> Result<()> {
        self.users().create(account)
    }

    fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        self.users().find_by_id(id)
    }

    fn find_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.users().find_by_username(username)
    }
}

impl StatsRepository for Database {
    fn record_game_result(
        &self,
        winner_id: Option<&str>,
        participant_ids: &[String],
    ) -> Result<()> {
        self.stats().record_game_result(winner_id, participant_ids)
    }

    fn get_stats(&self, user_id: &str) -> Result<Option<PlayerStats>> {
        self.stats().get(user_id)
    }
}
