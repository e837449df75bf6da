//! Plaza-world server
//!
//! Hosts the shared plaza presence world and the word-chain game rooms
//! over a single TCP listener. Game results are persisted through the
//! account/stats store when the database is available.

use std::sync::{Arc, Mutex};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use plaza_core::storage::Database;
use plaza_net::hub::ResultSink;
use plaza_net::Server;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match config::Config::load(None) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let addr = match config.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    // The stats store is a collaborator, not a dependency: the world
    // still runs when the database cannot be opened.
    let db_path = config.resolve_db_path();
    if let Some(parent) = db_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let results: Option<ResultSink> = match Database::open(&db_path) {
        Ok(db) => {
            tracing::info!(path = %db_path.display(), "stats database opened");
            let sink: ResultSink = Arc::new(Mutex::new(db));
            Some(sink)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %db_path.display(),
                "stats database unavailable, game results will not be recorded"
            );
            None
        }
    };

    let server = match Server::start(addr, config.max_connections, results).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("failed to start server: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(addr = %server.addr(), "plaza-world running, press ctrl-c to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
    server.shutdown();
}
