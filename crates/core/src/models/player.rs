//! Plaza player model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// X coordinate every player spawns at.
pub const SPAWN_X: f64 = 600.0;

/// Y coordinate every player spawns at.
pub const SPAWN_Y: f64 = 600.0;

/// Direction a player sprite faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

impl Facing {
    /// Parse a client-reported facing. Unrecognized values yield `None`
    /// so the caller can ignore the field.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "up" => Some(Facing::Up),
            "down" => Some(Facing::Down),
            "left" => Some(Facing::Left),
            "right" => Some(Facing::Right),
            _ => None,
        }
    }
}

/// Animation state a client reports for its player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimState {
    Idle,
    Walk,
    Fishing,
}

impl AnimState {
    /// Parse a client-reported animation state; `None` for unknown values.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "idle" => Some(AnimState::Idle),
            "walk" => Some(AnimState::Walk),
            "fishing" => Some(AnimState::Fishing),
            _ => None,
        }
    }
}

/// A player standing in the plaza. Doubles as the wire record, so the
/// field names are part of the protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlazaPlayer {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub facing: Facing,
    pub state: AnimState,
}

impl PlazaPlayer {
    /// A freshly joined player at the spawn point.
    pub fn spawn(id: Uuid, user_id: String, name: String) -> Self {
        Self {
            id,
            user_id,
            name,
            x: SPAWN_X,
            y: SPAWN_Y,
            facing: Facing::Down,
            state: AnimState::Idle,
        }
    }
}

/// Per-field position update from a move intent. Unset fields are left
/// alone; unrecognized enum values never make it in here.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub facing: Option<Facing>,
    pub state: Option<AnimState>,
}
