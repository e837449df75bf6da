//! Wire protocol for plaza-world
//!
//! All messages are JSON-serialized and length-prefixed on the wire.
//! Enums are internally tagged with `"type"` and every record is
//! camelCase; these names are the contract clients depend on.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use plaza_core::game::EndReason;
use plaza_core::models::{PlazaPlayer, Room, RoomSummary};
use plaza_core::plaza::{Plaza, PLAZA_MAP_ID};

/// Client → server intents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientIntent {
    Login {
        name: String,
    },
    /// Position update. Fields are individually optional; anything
    /// missing or unrecognized is ignored server-side, not rejected.
    PlazaMove {
        #[serde(default)]
        x: Option<f64>,
        #[serde(default)]
        y: Option<f64>,
        #[serde(default)]
        facing: Option<String>,
        #[serde(default)]
        state: Option<String>,
    },
    PlazaChat {
        text: String,
    },
    CreateRoom {
        name: String,
    },
    JoinRoom {
        room_id: Uuid,
    },
    LeaveRoom,
    RoomChat {
        room_id: Uuid,
        text: String,
    },
    StartWordGame {
        room_id: Uuid,
    },
    SubmitWord {
        room_id: Uuid,
        word: String,
    },
}

/// Server → client events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    LoginSuccess {
        self_id: Uuid,
        user_id: String,
        name: String,
        plaza: PlazaSnapshot,
        rooms: Vec<RoomSummary>,
    },
    PlazaJoin(PlazaPlayer),
    PlazaMove(PlazaPlayer),
    PlazaLeave {
        id: Uuid,
    },
    PlazaChat(ChatBroadcast),
    RoomList {
        rooms: Vec<RoomSummary>,
    },
    RoomJoined {
        room_id: Uuid,
    },
    RoomState(RoomSnapshot),
    RoomChat(RoomChatBroadcast),
    WordGameStarted {
        room_id: Uuid,
        state: RoomSnapshot,
    },
    WordGameTurn {
        room_id: Uuid,
        state: RoomSnapshot,
    },
    WordGameEnded {
        room_id: Uuid,
        reason: EndReason,
        winner_id: Option<Uuid>,
        scores: HashMap<Uuid, u32>,
    },
    /// Game-scoped system message; either to one connection (rejected
    /// intent) or the whole room (warnings, terminations).
    WordGameSystem {
        room_id: Uuid,
        msg: String,
    },
    WordSubmitted {
        room_id: Uuid,
        id: Uuid,
        user_id: String,
        name: String,
        word: String,
        gained: u32,
        total_score: u32,
    },
}

/// A relayed plaza chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBroadcast {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub text: String,
    pub time: DateTime<Utc>,
}

/// A relayed room chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomChatBroadcast {
    pub room_id: Uuid,
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub text: String,
    pub time: DateTime<Utc>,
}

/// Full plaza state, sent to a joining connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlazaSnapshot {
    pub map_id: String,
    pub players: Vec<PlazaPlayer>,
}

impl PlazaSnapshot {
    pub fn of(plaza: &Plaza) -> Self {
        Self {
            map_id: PLAZA_MAP_ID.to_string(),
            players: plaza.players().cloned().collect(),
        }
    }
}

/// Game state as seen on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub is_active: bool,
    pub current_turn_id: Option<Uuid>,
    pub last_word: Option<String>,
    pub used_count: usize,
    pub scores: HashMap<Uuid, u32>,
    pub round: u32,
    pub max_rounds: u32,
    pub turn_deadline: Option<DateTime<Utc>>,
}

/// Full room state, broadcast to its members
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: Uuid,
    pub name: String,
    pub map_id: String,
    pub players: Vec<Uuid>,
    pub word_game: GameSnapshot,
}

impl RoomSnapshot {
    pub fn of(room: &Room) -> Self {
        let game = &room.game;
        Self {
            id: room.id,
            name: room.name.clone(),
            map_id: room.map_id.clone(),
            players: room.members().to_vec(),
            word_game: GameSnapshot {
                is_active: game.is_active(),
                current_turn_id: game.current_turn_id(),
                last_word: game.last_word().map(str::to_string),
                used_count: game.used_words().len(),
                scores: game.scores().clone(),
                round: game.round(),
                max_rounds: game.max_rounds(),
                turn_deadline: game.turn_deadline(),
            },
        }
    }
}
