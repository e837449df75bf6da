//! The shared plaza presence world.
//!
//! One mapping of connection id to player, owned here and mutated only
//! through the operations below. Position updates are taken at face
//! value from the client; there is no server-side physics.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{MoveUpdate, PlazaPlayer};

/// Map identifier of the plaza world.
pub const PLAZA_MAP_ID: &str = "village";

/// The single always-on presence world.
#[derive(Debug, Default)]
pub struct Plaza {
    players: HashMap<Uuid, PlazaPlayer>,
}

impl Plaza {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a player at the spawn point. Re-joining with the same
    /// connection id returns the existing player untouched.
    pub fn join(&mut self, conn_id: Uuid, user_id: &str, name: &str) -> &PlazaPlayer {
        self.players
            .entry(conn_id)
            .or_insert_with(|| PlazaPlayer::spawn(conn_id, user_id.to_string(), name.to_string()))
    }

    /// Apply a move update field by field. Fields the update leaves unset
    /// are untouched; unknown connections yield `None`.
    pub fn apply_move(&mut self, conn_id: Uuid, update: MoveUpdate) -> Option<&PlazaPlayer> {
        let player = self.players.get_mut(&conn_id)?;
        if let Some(x) = update.x {
            player.x = x;
        }
        if let Some(y) = update.y {
            player.y = y;
        }
        if let Some(facing) = update.facing {
            player.facing = facing;
        }
        if let Some(state) = update.state {
            player.state = state;
        }
        Some(player)
    }

    /// Remove a player; reports whether one was present.
    pub fn leave(&mut self, conn_id: Uuid) -> bool {
        self.players.remove(&conn_id).is_some()
    }

    pub fn get(&self, conn_id: Uuid) -> Option<&PlazaPlayer> {
        self.players.get(&conn_id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlazaPlayer> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnimState, Facing, SPAWN_X, SPAWN_Y};

    #[test]
    fn test_join_spawns_at_fixed_point() {
        let mut plaza = Plaza::new();
        let id = Uuid::new_v4();
        let player = plaza.join(id, "U11111", "alice");
        assert_eq!((player.x, player.y), (SPAWN_X, SPAWN_Y));
        assert_eq!(plaza.len(), 1);
    }

    #[test]
    fn test_rejoin_is_idempotent() {
        let mut plaza = Plaza::new();
        let id = Uuid::new_v4();
        plaza.join(id, "U11111", "alice");
        plaza.apply_move(
            id,
            MoveUpdate {
                x: Some(10.0),
                ..Default::default()
            },
        );
        let player = plaza.join(id, "U11111", "alice");
        assert_eq!(player.x, 10.0);
        assert_eq!(plaza.len(), 1);
    }

    #[test]
    fn test_move_updates_fields_individually() {
        let mut plaza = Plaza::new();
        let id = Uuid::new_v4();
        plaza.join(id, "U11111", "alice");

        let player = plaza
            .apply_move(
                id,
                MoveUpdate {
                    x: Some(12.5),
                    facing: Some(Facing::Left),
                    state: Some(AnimState::Walk),
                    y: None,
                },
            )
            .unwrap();
        assert_eq!(player.x, 12.5);
        assert_eq!(player.y, SPAWN_Y);
        assert_eq!(player.facing, Facing::Left);
        assert_eq!(player.state, AnimState::Walk);
    }

    #[test]
    fn test_move_for_unknown_connection_is_ignored() {
        let mut plaza = Plaza::new();
        assert!(plaza
            .apply_move(Uuid::new_v4(), MoveUpdate::default())
            .is_none());
    }

    #[test]
    fn test_leave_reports_presence() {
        let mut plaza = Plaza::new();
        let id = Uuid::new_v4();
        plaza.join(id, "U11111", "alice");
        assert!(plaza.leave(id));
        assert!(!plaza.leave(id));
        assert!(plaza.is_empty());
    }
}
