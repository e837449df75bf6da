//! Room model - a transient container for one word-chain game

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::WordChainGame;

/// Name given to rooms created without one.
pub const DEFAULT_ROOM_NAME: &str = "Untitled Room";

/// Map identifier rooms are created with.
pub const DEFAULT_ROOM_MAP: &str = "room_basic";

/// A room: a member list in join order plus its embedded game.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub map_id: String,
    /// Member connection ids in join order; this order seeds the turn
    /// order when a game starts.
    members: Vec<Uuid>,
    pub game: WordChainGame,
}

impl Room {
    pub fn new(name: &str) -> Self {
        let trimmed = name.trim();
        Self {
            id: Uuid::new_v4(),
            name: if trimmed.is_empty() {
                DEFAULT_ROOM_NAME.to_string()
            } else {
                trimmed.to_string()
            },
            map_id: DEFAULT_ROOM_MAP.to_string(),
            members: Vec::new(),
            game: WordChainGame::new(),
        }
    }

    pub fn members(&self) -> &[Uuid] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_member(&self, conn_id: Uuid) -> bool {
        self.members.contains(&conn_id)
    }

    pub(crate) fn add_member(&mut self, conn_id: Uuid) {
        if !self.members.contains(&conn_id) {
            self.members.push(conn_id);
        }
    }

    pub(crate) fn remove_member(&mut self, conn_id: Uuid) -> bool {
        let before = self.members.len();
        self.members.retain(|&m| m != conn_id);
        self.members.len() < before
    }

    /// Directory listing entry for this room.
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id,
            name: self.name.clone(),
            player_count: self.members.len(),
            is_active: self.game.is_active(),
        }
    }
}

/// One row of the room directory listing. Always derived from a live
/// room, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: Uuid,
    pub name: String,
    pub player_count: usize,
    pub is_active: bool,
}
