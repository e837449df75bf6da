//! Plaza-world network layer
//!
//! TCP transport and orchestration for the plaza/room world.
//!
//! # Architecture
//!
//! - **Protocol**: length-prefixed JSON frames carrying internally
//!   tagged `ClientIntent` / `ServerEvent` records
//! - **Hub**: one task owns all mutable world state and processes
//!   requests strictly one at a time
//! - **Server**: accept loop plus a reader and writer task per connection
//! - **Client**: thin handle for tests and tooling
//!
//! # Usage
//!
//! ```ignore
//! let server = Server::start("0.0.0.0:7410".parse()?, 256, None).await?;
//!
//! let mut client = Client::connect(server.addr()).await?;
//! client.login("alice").await?;
//! while let Some(event) = client.next_event().await {
//!     match event {
//!         ServerEvent::PlazaChat(msg) => { /* handle */ }
//!         _ => {}
//!     }
//! }
//! ```

pub mod client;
pub mod error;
mod frame;
pub mod hub;
pub mod protocol;
pub mod server;

pub use client::Client;
pub use error::{Error, Result};
pub use hub::{Hub, HubRequest, HubTx, ResultSink};
pub use protocol::{ClientIntent, ServerEvent};
pub use server::{Server, DEFAULT_MAX_CONNECTIONS};

/// Default port for plaza-world servers
pub const DEFAULT_PORT: u16 = 7410;
