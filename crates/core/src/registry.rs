//! Connection identity registry.
//!
//! Maps each live transport connection to its identity: a generated user
//! tag and a sanitized display name. Room membership is tracked by the
//! room directory, not here, so "at most one room per connection" has a
//! single owner.

use std::collections::HashMap;

use rand::Rng;
use uuid::Uuid;

/// Display name used when a login request has nothing usable.
pub const DEFAULT_NAME: &str = "Guest";

/// Identity assigned to a connection at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub conn_id: Uuid,
    /// Short generated tag, e.g. `U7F3K9`. Stable for the connection's
    /// lifetime and used as the stats key.
    pub user_id: String,
    pub name: String,
}

/// Outcome of a login request.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub identity: Identity,
    /// False when the connection was already logged in; the request is
    /// then a no-op and nothing should be announced.
    pub fresh: bool,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    identities: HashMap<Uuid, Identity>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an identity. A second login on the same connection is
    /// ignored and returns the existing identity unchanged.
    pub fn login(&mut self, conn_id: Uuid, requested_name: &str) -> LoginOutcome {
        if let Some(existing) = self.identities.get(&conn_id) {
            return LoginOutcome {
                identity: existing.clone(),
                fresh: false,
            };
        }

        let name = requested_name.trim();
        let identity = Identity {
            conn_id,
            user_id: make_user_id(),
            name: if name.is_empty() {
                DEFAULT_NAME.to_string()
            } else {
                name.to_string()
            },
        };
        self.identities.insert(conn_id, identity.clone());
        LoginOutcome {
            identity,
            fresh: true,
        }
    }

    pub fn identity(&self, conn_id: Uuid) -> Option<&Identity> {
        self.identities.get(&conn_id)
    }

    /// Tear down a connection's identity. Safe for connections that never
    /// logged in, and for repeated calls.
    pub fn disconnect(&mut self, conn_id: Uuid) -> Option<Identity> {
        self.identities.remove(&conn_id)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

/// Generate a short user tag, e.g. `U7F3K9`.
fn make_user_id() -> String {
    const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut rng = rand::thread_rng();
    let tag: String = (0..5)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("U{tag}")
}
