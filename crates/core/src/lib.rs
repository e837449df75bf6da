//! Plaza-world core library
//!
//! Domain state machines for the shared plaza presence world, the room
//! directory and the word-chain game engine, plus the SQLite-backed
//! account/stats store. Everything here is synchronous and I/O-free
//! except the storage layer; the network crate drives it from a single
//! serialized event loop.

pub mod auth;
pub mod error;
pub mod game;
pub mod invariants;
pub mod models;
pub mod plaza;
pub mod registry;
pub mod rooms;
pub mod storage;

pub use auth::Accounts;
pub use error::{Error, Result};
pub use game::{
    EndReason, GameEnd, RemovalOutcome, StartError, SubmitError, SubmitOutcome, TurnAdvance,
    WordChainGame,
};
pub use models::*;
pub use plaza::{Plaza, PLAZA_MAP_ID};
pub use registry::{ConnectionRegistry, Identity, LoginOutcome};
pub use rooms::{GameFallout, JoinOutcome, LeaveOutcome, RoomDirectory};
pub use storage::{AccountRepository, Database, StatsRepository, StatsStore, Storage, UserStore};
