//! Account storage operations

use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::Account;

pub struct UserStore<'a> {
    conn: &'a Connection,
}

impl<'a> UserStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new account and seed its stats row
    #[instrument(skip(self, account), fields(username = %account.username))]
    pub fn create(&self, account: &Account) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (id, username, password_hash, nickname, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                account.id.to_string(),
                account.username,
                account.password_hash,
                account.nickname,
                account.created_at.to_rfc3339(),
            ],
        )?;
        self.conn.execute(
            "INSERT OR IGNORE INTO player_stats (user_id) VALUES (?1)",
            params![account.id.to_string()],
        )?;
        Ok(())
    }

    /// Find account by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, password_hash, nickname, created_at FROM users WHERE id = ?1",
        )?;

        let account = stmt
            .query_row(params![id.to_string()], |row| {
                Ok(Account {
                    id: parse_uuid(&row.get::<_, String>(0)?)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                    nickname: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?)?,
                })
            })
            .optional()?;

        Ok(account)
    }

    /// Find account by username
    #[instrument(skip(self))]
    pub fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, password_hash, nickname, created_at FROM users WHERE username = ?1",
        )?;

        let account = stmt
            .query_row(params![username], |row| {
                Ok(Account {
                    id: parse_uuid(&row.get::<_, String>(0)?)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                    nickname: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?)?,
                })
            })
            .optional()?;

        Ok(account)
    }
}
