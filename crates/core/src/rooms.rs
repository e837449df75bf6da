//! Room directory: create/join/leave lifecycle.
//!
//! The directory owns both each room's member list and the
//! connection-to-room index, so the at-most-one-membership rule is
//! enforced in one place. A room whose member set becomes empty is
//! destroyed. Departures are reconciled with the embedded game before
//! the caller gets to broadcast anything.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::game::{GameEnd, RemovalOutcome};
use crate::invariants::assert_room_invariants;
use crate::models::{Room, RoomSummary};

/// What a departure did to the room's game.
#[derive(Debug, Clone, PartialEq)]
pub enum GameFallout {
    /// No running game, or the leaver was not in it.
    Untouched,
    /// Game continues; re-broadcast the active turn if `turn_changed`.
    Continues { turn_changed: bool },
    /// The departure terminated the game.
    Ended(GameEnd),
}

/// Result of a departure.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveOutcome {
    pub room_id: Uuid,
    /// The member set became empty and the room no longer exists.
    pub destroyed: bool,
    pub game: GameFallout,
}

/// Result of joining a room.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    pub room_id: Uuid,
    /// Departure from the previously occupied room, if there was one.
    pub prior: Option<LeaveOutcome>,
}

#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<Uuid, Room>,
    by_conn: HashMap<Uuid, Uuid>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty room. The creator still joins through
    /// `join_room`, like everyone else.
    pub fn create_room(&mut self, name: &str) -> Uuid {
        let room = Room::new(name);
        let room_id = room.id;
        self.rooms.insert(room_id, room);
        room_id
    }

    pub fn room(&self, room_id: Uuid) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    pub fn room_mut(&mut self, room_id: Uuid) -> Option<&mut Room> {
        self.rooms.get_mut(&room_id)
    }

    /// Room the connection currently occupies, if any.
    pub fn room_of(&self, conn_id: Uuid) -> Option<Uuid> {
        self.by_conn.get(&conn_id).copied()
    }

    /// Join a room, implicitly leaving any other room first. An unknown
    /// room id leaves current membership untouched.
    pub fn join_room(
        &mut self,
        conn_id: Uuid,
        room_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome> {
        if !self.rooms.contains_key(&room_id) {
            return Err(Error::NotFound(format!("room {room_id}")));
        }

        let prior = match self.by_conn.get(&conn_id).copied() {
            Some(current) if current != room_id => self.leave_room(conn_id, now),
            _ => None,
        };

        match self.rooms.get_mut(&room_id) {
            Some(room) => {
                room.add_member(conn_id);
                self.by_conn.insert(conn_id, room_id);
                assert_room_invariants(room);
                Ok(JoinOutcome { room_id, prior })
            }
            None => Err(Error::NotFound(format!("room {room_id}"))),
        }
    }

    /// Leave the current room, if any. Reconciles the game state and
    /// destroys the room when its member set becomes empty. Calling this
    /// for a connection with no membership is a no-op.
    pub fn leave_room(&mut self, conn_id: Uuid, now: DateTime<Utc>) -> Option<LeaveOutcome> {
        let room_id = self.by_conn.remove(&conn_id)?;
        let room = self.rooms.get_mut(&room_id)?;

        room.remove_member(conn_id);
        let game = match room.game.remove_player(conn_id, now) {
            RemovalOutcome::NotPlaying => GameFallout::Untouched,
            RemovalOutcome::Continues { turn_changed } => GameFallout::Continues { turn_changed },
            RemovalOutcome::Ended(end) => GameFallout::Ended(end),
        };

        let destroyed = room.member_count() == 0;
        if destroyed {
            self.rooms.remove(&room_id);
        } else if let Some(room) = self.rooms.get(&room_id) {
            assert_room_invariants(room);
        }

        Some(LeaveOutcome {
            room_id,
            destroyed,
            game,
        })
    }

    /// Directory listing, derived from live rooms on every call.
    pub fn list_rooms(&self) -> Vec<RoomSummary> {
        self.rooms.values().map(Room::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
