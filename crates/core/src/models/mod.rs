//! Data models for plaza-world

mod account;
mod player;
mod room;

pub use account::*;
pub use player::*;
pub use room::*;
