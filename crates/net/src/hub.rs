//! Serialized world hub.
//!
//! One hub task exclusively owns all mutable world state: connection
//! identities, the plaza, the room directory and the per-connection
//! outbound channels. Requests arrive over a single mpsc channel and are
//! processed one at a time, run to completion, so no two mutations of
//! the same room or of the plaza can ever interleave. Broadcasts are
//! fire-and-forget sends that never block the loop.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use plaza_core::game::{EndReason, GameEnd, StartError, SubmitError, SubmitOutcome, TurnAdvance};
use plaza_core::models::{AnimState, Facing, MoveUpdate};
use plaza_core::rooms::{GameFallout, LeaveOutcome};
use plaza_core::storage::StatsRepository;
use plaza_core::{ConnectionRegistry, Plaza, RoomDirectory};

use crate::protocol::{
    ChatBroadcast, ClientIntent, PlazaSnapshot, RoomChatBroadcast, RoomSnapshot, ServerEvent,
};

/// Outbound event channel for one connection.
pub type OutboundTx = mpsc::UnboundedSender<ServerEvent>;
pub type OutboundRx = mpsc::UnboundedReceiver<ServerEvent>;

/// Channel into the hub task.
pub type HubTx = mpsc::UnboundedSender<HubRequest>;
pub type HubRx = mpsc::UnboundedReceiver<HubRequest>;

/// Sink the hub reports completed games to (the stats collaborator).
pub type ResultSink = Arc<Mutex<dyn StatsRepository + Send>>;

/// Requests flowing from connection tasks into the hub.
#[derive(Debug)]
pub enum HubRequest {
    /// A transport connection opened; `tx` is its event channel.
    Connect { conn_id: Uuid, tx: OutboundTx },
    /// A decoded intent from a connection.
    Intent {
        conn_id: Uuid,
        intent: ClientIntent,
    },
    /// The transport saw the connection drop.
    Disconnect { conn_id: Uuid },
}

pub struct Hub {
    registry: ConnectionRegistry,
    plaza: Plaza,
    rooms: RoomDirectory,
    conns: HashMap<Uuid, OutboundTx>,
    /// conn → user tag captured at game start, per room. Kept separately
    /// from the live registry so results can be recorded even after
    /// participants disconnect.
    rosters: HashMap<Uuid, HashMap<Uuid, String>>,
    results: Option<ResultSink>,
}

impl Hub {
    pub fn new(results: Option<ResultSink>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            plaza: Plaza::new(),
            rooms: RoomDirectory::new(),
            conns: HashMap::new(),
            rosters: HashMap::new(),
            results,
        }
    }

    /// Run until every `HubTx` has been dropped.
    pub async fn run(mut self, mut rx: HubRx) {
        while let Some(req) = rx.recv().await {
            self.handle(req);
        }
        debug!("hub loop shutting down");
    }

    /// Process one request to completion.
    pub fn handle(&mut self, req: HubRequest) {
        match req {
            HubRequest::Connect { conn_id, tx } => {
                self.conns.insert(conn_id, tx);
            }
            HubRequest::Intent { conn_id, intent } => self.handle_intent(conn_id, intent),
            HubRequest::Disconnect { conn_id } => self.handle_disconnect(conn_id),
        }
    }

    fn handle_intent(&mut self, conn_id: Uuid, intent: ClientIntent) {
        match intent {
            ClientIntent::Login { name } => self.login(conn_id, &name),
            ClientIntent::PlazaMove { x, y, facing, state } => {
                self.plaza_move(conn_id, x, y, facing.as_deref(), state.as_deref())
            }
            ClientIntent::PlazaChat { text } => self.plaza_chat(conn_id, &text),
            ClientIntent::CreateRoom { name } => self.create_room(conn_id, &name),
            ClientIntent::JoinRoom { room_id } => self.join_room(conn_id, room_id),
            ClientIntent::LeaveRoom => self.leave_room(conn_id),
            ClientIntent::RoomChat { room_id, text } => self.room_chat(conn_id, room_id, &text),
            ClientIntent::StartWordGame { room_id } => self.start_word_game(conn_id, room_id),
            ClientIntent::SubmitWord { room_id, word } => {
                self.submit_word(conn_id, room_id, &word)
            }
        }
    }

    fn handle_disconnect(&mut self, conn_id: Uuid) {
        let now = Utc::now();
        let identity = self.registry.disconnect(conn_id);
        let was_in_plaza = self.plaza.leave(conn_id);
        let left = self.rooms.leave_room(conn_id, now);
        self.conns.remove(&conn_id);

        if let Some(outcome) = left {
            self.after_leave(&outcome);
        }
        self.broadcast_room_list();
        if was_in_plaza {
            self.broadcast_plaza(ServerEvent::PlazaLeave { id: conn_id }, None);
        }
        if let Some(identity) = identity {
            info!(%conn_id, user_id = %identity.user_id, "connection closed");
        }
    }

    // --- intents ---------------------------------------------------------

    fn login(&mut self, conn_id: Uuid, name: &str) {
        let outcome = self.registry.login(conn_id, name);
        if !outcome.fresh {
            return;
        }
        let identity = outcome.identity;
        info!(%conn_id, user_id = %identity.user_id, name = %identity.name, "logged in");

        let player = self
            .plaza
            .join(conn_id, &identity.user_id, &identity.name)
            .clone();

        self.send_to(
            conn_id,
            ServerEvent::LoginSuccess {
                self_id: conn_id,
                user_id: identity.user_id,
                name: identity.name,
                plaza: PlazaSnapshot::of(&self.plaza),
                rooms: self.rooms.list_rooms(),
            },
        );
        self.broadcast_plaza(ServerEvent::PlazaJoin(player), Some(conn_id));
    }

    fn plaza_move(
        &mut self,
        conn_id: Uuid,
        x: Option<f64>,
        y: Option<f64>,
        facing: Option<&str>,
        state: Option<&str>,
    ) {
        let update = MoveUpdate {
            x,
            y,
            facing: facing.and_then(Facing::from_name),
            state: state.and_then(AnimState::from_name),
        };
        let Some(player) = self.plaza.apply_move(conn_id, update) else {
            return;
        };
        let player = player.clone();
        // Moves echo back to the mover as well.
        self.broadcast_plaza(ServerEvent::PlazaMove(player), None);
    }

    fn plaza_chat(&mut self, conn_id: Uuid, text: &str) {
        let Some(identity) = self.registry.identity(conn_id) else {
            return;
        };
        let msg = text.trim();
        if msg.is_empty() {
            return;
        }
        let event = ServerEvent::PlazaChat(ChatBroadcast {
            id: conn_id,
            user_id: identity.user_id.clone(),
            name: identity.name.clone(),
            text: msg.to_string(),
            time: Utc::now(),
        });
        self.broadcast_plaza(event, None);
    }

    fn create_room(&mut self, conn_id: Uuid, name: &str) {
        if self.registry.identity(conn_id).is_none() {
            return;
        }
        let room_id = self.rooms.create_room(name);
        info!(%conn_id, %room_id, "room created");
        self.join_room(conn_id, room_id);
    }

    fn join_room(&mut self, conn_id: Uuid, room_id: Uuid) {
        if self.registry.identity(conn_id).is_none() {
            return;
        }
        match self.rooms.join_room(conn_id, room_id, Utc::now()) {
            Ok(outcome) => {
                if let Some(prior) = outcome.prior {
                    self.after_leave(&prior);
                }
                self.broadcast_room_state(room_id);
                self.send_to(conn_id, ServerEvent::RoomJoined { room_id });
                self.broadcast_room_list();
            }
            Err(_) => {
                debug!(%conn_id, %room_id, "join for unknown room ignored");
            }
        }
    }

    fn leave_room(&mut self, conn_id: Uuid) {
        if let Some(outcome) = self.rooms.leave_room(conn_id, Utc::now()) {
            self.after_leave(&outcome);
        }
        self.broadcast_room_list();
    }

    fn room_chat(&mut self, conn_id: Uuid, room_id: Uuid, text: &str) {
        let Some(identity) = self.registry.identity(conn_id) else {
            return;
        };
        let is_member = self
            .rooms
            .room(room_id)
            .is_some_and(|room| room.is_member(conn_id));
        if !is_member {
            return;
        }
        let msg = text.trim();
        if msg.is_empty() {
            return;
        }
        let event = ServerEvent::RoomChat(RoomChatBroadcast {
            room_id,
            id: conn_id,
            user_id: identity.user_id.clone(),
            name: identity.name.clone(),
            text: msg.to_string(),
            time: Utc::now(),
        });
        self.broadcast_room(room_id, event);
    }

    fn start_word_game(&mut self, conn_id: Uuid, room_id: Uuid) {
        if self.registry.identity(conn_id).is_none() {
            return;
        }
        let members: Vec<Uuid> = match self.rooms.room(room_id) {
            Some(room) if room.is_member(conn_id) => room.members().to_vec(),
            _ => return,
        };

        let started = match self.rooms.room_mut(room_id) {
            Some(room) => room.game.start(&members, Utc::now()),
            None => return,
        };

        match started {
            Ok(()) => {
                let roster: HashMap<Uuid, String> = members
                    .iter()
                    .filter_map(|&m| {
                        self.registry
                            .identity(m)
                            .map(|identity| (m, identity.user_id.clone()))
                    })
                    .collect();
                self.rosters.insert(room_id, roster);
                info!(%room_id, players = members.len(), "word game started");

                if let Some(state) = self.room_snapshot(room_id) {
                    self.broadcast_room(room_id, ServerEvent::WordGameStarted { room_id, state });
                }
                self.broadcast_room(
                    room_id,
                    ServerEvent::WordGameSystem {
                        room_id,
                        msg: "Word chain started!".to_string(),
                    },
                );
            }
            Err(StartError::AlreadyActive) => {
                self.system_to(conn_id, room_id, "A game is already running.");
            }
            Err(StartError::NotEnoughPlayers) => {
                self.system_to(conn_id, room_id, "At least 2 players are needed.");
            }
        }
    }

    fn submit_word(&mut self, conn_id: Uuid, room_id: Uuid, raw_word: &str) {
        let Some(identity) = self.registry.identity(conn_id).cloned() else {
            return;
        };
        let is_member = self
            .rooms
            .room(room_id)
            .is_some_and(|room| room.is_member(conn_id));
        if !is_member {
            return;
        }

        let result = match self.rooms.room_mut(room_id) {
            Some(room) => room.game.submit_word(conn_id, raw_word, Utc::now()),
            None => return,
        };

        let word = raw_word.trim();
        match result {
            Err(SubmitError::NotActive) => {
                self.system_to(conn_id, room_id, "The game has not started yet.");
            }
            Err(SubmitError::NotYourTurn) => {
                self.system_to(conn_id, room_id, "It is not your turn.");
            }
            Err(SubmitError::EmptyWord) => {
                self.system_to(conn_id, room_id, "A blank word does not count.");
            }
            Ok(SubmitOutcome::Ended {
                end,
                format_warning,
            }) => {
                if format_warning {
                    self.warn_word_format(room_id, &identity.name, word);
                }
                let msg = match end.reason {
                    EndReason::Timeout => "Time is up! Round over.".to_string(),
                    EndReason::DuplicateWord => format!(
                        "{} played an already used word ({word}). Round over!",
                        identity.name
                    ),
                    _ => format!("{} broke the chain ({word}). Round over!", identity.name),
                };
                self.broadcast_room(room_id, ServerEvent::WordGameSystem { room_id, msg });
                self.finish_game(room_id, &end);
            }
            Ok(SubmitOutcome::Accepted {
                word,
                gained,
                total,
                format_warning,
                advance,
            }) => {
                if format_warning {
                    self.warn_word_format(room_id, &identity.name, &word);
                }
                self.broadcast_room(
                    room_id,
                    ServerEvent::WordSubmitted {
                        room_id,
                        id: conn_id,
                        user_id: identity.user_id.clone(),
                        name: identity.name.clone(),
                        word,
                        gained,
                        total_score: total,
                    },
                );
                match advance {
                    TurnAdvance::Next => {
                        if let Some(state) = self.room_snapshot(room_id) {
                            self.broadcast_room(
                                room_id,
                                ServerEvent::WordGameTurn { room_id, state },
                            );
                        }
                    }
                    TurnAdvance::GameOver(end) => self.finish_game(room_id, &end),
                }
            }
        }
    }

    // --- shared plumbing -------------------------------------------------

    /// Broadcast consequences of a departure the directory reported:
    /// game reconciliation first, then the room snapshot (if the room
    /// survived), exactly in that order.
    fn after_leave(&mut self, outcome: &LeaveOutcome) {
        match &outcome.game {
            GameFallout::Untouched => {}
            GameFallout::Continues { turn_changed } => {
                if *turn_changed {
                    if let Some(state) = self.room_snapshot(outcome.room_id) {
                        self.broadcast_room(
                            outcome.room_id,
                            ServerEvent::WordGameTurn {
                                room_id: outcome.room_id,
                                state,
                            },
                        );
                    }
                }
            }
            GameFallout::Ended(end) => self.finish_game(outcome.room_id, end),
        }

        if outcome.destroyed {
            self.rosters.remove(&outcome.room_id);
        } else {
            self.broadcast_room_state(outcome.room_id);
        }
    }

    fn finish_game(&mut self, room_id: Uuid, end: &GameEnd) {
        self.broadcast_room(
            room_id,
            ServerEvent::WordGameEnded {
                room_id,
                reason: end.reason,
                winner_id: end.winner_id,
                scores: end.scores.clone(),
            },
        );
        self.record_result(room_id, end);
    }

    /// Report a completed game to the stats collaborator, exactly once.
    fn record_result(&mut self, room_id: Uuid, end: &GameEnd) {
        let Some(roster) = self.rosters.remove(&room_id) else {
            return;
        };
        let Some(sink) = &self.results else {
            return;
        };
        let winner = end.winner_id.and_then(|id| roster.get(&id).cloned());
        let participants: Vec<String> = roster.into_values().collect();
        match sink.lock() {
            Ok(store) => {
                if let Err(e) = store.record_game_result(winner.as_deref(), &participants) {
                    warn!(error = %e, %room_id, "failed to record game result");
                }
            }
            Err(_) => warn!(%room_id, "stats store poisoned; game result not recorded"),
        }
    }

    fn warn_word_format(&self, room_id: Uuid, name: &str, word: &str) {
        self.broadcast_room(
            room_id,
            ServerEvent::WordGameSystem {
                room_id,
                msg: format!("{name}'s word ({word}) is not in the dictionary, counting it anyway."),
            },
        );
    }

    fn system_to(&self, conn_id: Uuid, room_id: Uuid, msg: &str) {
        self.send_to(
            conn_id,
            ServerEvent::WordGameSystem {
                room_id,
                msg: msg.to_string(),
            },
        );
    }

    fn send_to(&self, conn_id: Uuid, event: ServerEvent) {
        if let Some(tx) = self.conns.get(&conn_id) {
            if tx.send(event).is_err() {
                debug!(%conn_id, "failed to queue event for connection");
            }
        }
    }

    fn broadcast_plaza(&self, event: ServerEvent, except: Option<Uuid>) {
        for player in self.plaza.players() {
            if Some(player.id) != except {
                self.send_to(player.id, event.clone());
            }
        }
    }

    fn broadcast_room(&self, room_id: Uuid, event: ServerEvent) {
        if let Some(room) = self.rooms.room(room_id) {
            for &member in room.members() {
                self.send_to(member, event.clone());
            }
        }
    }

    fn broadcast_room_state(&self, room_id: Uuid) {
        if let Some(state) = self.room_snapshot(room_id) {
            self.broadcast_room(room_id, ServerEvent::RoomState(state));
        }
    }

    /// Room-list changes go to every connection, logged in or not.
    fn broadcast_room_list(&self) {
        let rooms = self.rooms.list_rooms();
        for tx in self.conns.values() {
            if tx
                .send(ServerEvent::RoomList {
                    rooms: rooms.clone(),
                })
                .is_err()
            {
                debug!("failed to queue room list");
            }
        }
    }

    fn room_snapshot(&self, room_id: Uuid) -> Option<RoomSnapshot> {
        self.rooms.room(room_id).map(RoomSnapshot::of)
    }
}
