//! Account and stats models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(username: String, password_hash: String, nickname: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            nickname,
            created_at: Utc::now(),
        }
    }
}

/// Aggregate game results for one user id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub games_played: u64,
    pub wins: u64,
    pub points: u64,
}
