//! Storage repository traits
//!
//! These traits define the storage interface, allowing for different
//! implementations (SQLite, mock, future network backend).

use uuid::Uuid;

use crate::error::Result;
use crate::models::{Account, PlayerStats};

/// Account repository operations
pub trait AccountRepository {
    /// Create a new account
    fn create_account(&self, account: &Account) -> Result<()>;

    /// Find account by ID
    fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    /// Find account by username
    fn find_account_by_username(&self, username: &str) -> Result<Option<Account>>;
}

/// Aggregate game-result operations
pub trait StatsRepository {
    /// Record one completed game for all participants
    fn record_game_result(&self, winner_id: Option<&str>, participant_ids: &[String])
        -> Result<()>;

    /// Look up one user's aggregate stats
    fn get_stats(&self, user_id: &str) -> Result<Option<PlayerStats>>;
}

/// Combined storage interface
pub trait Storage: AccountRepository + StatsRepository {}

// Blanket implementation: any type implementing both traits implements Storage
impl<T> Storage for T where T: AccountRepository + StatsRepository {}
