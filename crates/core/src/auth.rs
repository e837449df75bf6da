//! Account creation and credential verification.
//!
//! The narrow authentication collaborator: `create_user`, `authenticate`,
//! `record_game_result`, `get_stats`. Passwords are hashed with Argon2id;
//! plaintext never reaches the database.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{Error, Result};
use crate::models::{Account, PlayerStats};
use crate::storage::Database;

/// Minimum username length
const MIN_USERNAME_LEN: usize = 3;

/// Minimum password length
const MIN_PASSWORD_LEN: usize = 6;

/// Account service over the storage layer
pub struct Accounts<'a> {
    db: &'a Database,
}

impl<'a> Accounts<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Register a new account with a unique handle
    pub fn create_user(&self, username: &str, password: &str, nickname: &str) -> Result<Account> {
        if username.len() < MIN_USERNAME_LEN {
            return Err(Error::InvalidOperation(format!(
                "username must be at least {MIN_USERNAME_LEN} characters"
            )));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(Error::InvalidOperation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.db.users().find_by_username(username)?.is_some() {
            return Err(Error::InvalidOperation(format!(
                "username {username} already taken"
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Authentication(e.to_string()))?
            .to_string();

        let nickname = nickname.trim();
        let account = Account::new(
            username.to_string(),
            password_hash,
            if nickname.is_empty() {
                username.to_string()
            } else {
                nickname.to_string()
            },
        );
        self.db.users().create(&account)?;
        Ok(account)
    }

    /// Verify credentials; `None` for an unknown handle or a wrong
    /// password.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<Account>> {
        let Some(account) = self.db.users().find_by_username(username)? else {
            return Ok(None);
        };

        let parsed = PasswordHash::new(&account.password_hash)
            .map_err(|e| Error::Authentication(e.to_string()))?;
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            return Ok(None);
        }

        Ok(Some(account))
    }

    /// Record one completed game result
    pub fn record_game_result(
        &self,
        winner_id: Option<&str>,
        participant_ids: &[String],
    ) -> Result<()> {
        self.db.stats().record_game_result(winner_id, participant_ids)
    }

    /// Look up aggregate stats for a user id
    pub fn get_stats(&self, user_id: &str) -> Result<Option<PlayerStats>> {
        self.db.stats().get(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_register_and_authenticate() {
        let db = db();
        let accounts = Accounts::new(&db);

        let created = accounts.create_user("alice", "secret99", "Alice").unwrap();
        assert_eq!(created.nickname, "Alice");
        assert_ne!(created.password_hash, "secret99");

        let verified = accounts.authenticate("alice", "secret99").unwrap();
        assert_eq!(verified.map(|a| a.id), Some(created.id));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let db = db();
        let accounts = Accounts::new(&db);
        accounts.create_user("alice", "secret99", "Alice").unwrap();

        assert!(accounts.authenticate("alice", "wrong").unwrap().is_none());
        assert!(accounts.authenticate("nobody", "secret99").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_handle_rejected() {
        let db = db();
        let accounts = Accounts::new(&db);
        accounts.create_user("alice", "secret99", "Alice").unwrap();

        assert!(matches!(
            accounts.create_user("alice", "other-pass", "Other"),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_short_credentials_rejected() {
        let db = db();
        let accounts = Accounts::new(&db);
        assert!(accounts.create_user("al", "secret99", "Al").is_err());
        assert!(accounts.create_user("alice", "pw", "Alice").is_err());
    }

    #[test]
    fn test_new_account_starts_with_empty_stats() {
        let db = db();
        let accounts = Accounts::new(&db);
        let account = accounts.create_user("alice", "secret99", "Alice").unwrap();

        let stats = accounts.get_stats(&account.id.to_string()).unwrap().unwrap();
        assert_eq!(stats, PlayerStats::default());
    }

    #[test]
    fn test_nickname_falls_back_to_username() {
        let db = db();
        let accounts = Accounts::new(&db);
        let account = accounts.create_user("alice", "secret99", "  ").unwrap();
        assert_eq!(account.nickname, "alice");
    }
}
