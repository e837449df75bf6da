//! TCP server: accept loop and per-connection transport tasks.
//!
//! Each accepted connection gets a reader task (frames in, hub requests
//! out) and a writer task (hub events in, frames out). All game and
//! presence logic lives in the hub task; the transport only moves bytes.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::hub::{Hub, HubRequest, HubTx, OutboundRx, ResultSink};
use crate::protocol::ClientIntent;

/// Default cap on simultaneous connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 256;

/// Running server handle
pub struct Server {
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Bind and start serving. Game results are reported to `results`
    /// when a sink is provided.
    pub async fn start(
        addr: SocketAddr,
        max_connections: usize,
        results: Option<ResultSink>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let bound_addr = listener.local_addr()?;

        info!(addr = %bound_addr, "server listening");

        let (hub_tx, hub_rx) = mpsc::unbounded_channel();
        tokio::spawn(Hub::new(results).run(hub_rx));

        let (shutdown_tx, _) = broadcast::channel(1);
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(accept_loop(listener, hub_tx, max_connections, shutdown_rx));

        Ok(Server {
            addr: bound_addr,
            shutdown_tx,
        })
    }

    /// Get the server's bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        info!("server shutdown initiated");
    }
}

/// Accept incoming connections
async fn accept_loop(
    listener: TcpListener,
    hub_tx: HubTx,
    max_connections: usize,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let active = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        if active.load(Ordering::Relaxed) >= max_connections {
                            warn!(%peer, max_connections, "connection limit reached, dropping");
                            continue;
                        }
                        let conn_id = Uuid::new_v4();
                        debug!(%peer, %conn_id, "connection accepted");

                        active.fetch_add(1, Ordering::Relaxed);
                        let hub_tx = hub_tx.clone();
                        let active = active.clone();
                        tokio::spawn(async move {
                            handle_connection(conn_id, stream, hub_tx).await;
                            active.fetch_sub(1, Ordering::Relaxed);
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "accept failed");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("accept loop shutting down");
                break;
            }
        }
    }
}

/// Handle a single client connection
async fn handle_connection(conn_id: Uuid, stream: TcpStream, hub_tx: HubTx) {
    let (mut reader, writer) = tokio::io::split(stream);

    let (out_tx, out_rx) = mpsc::unbounded_channel();
    if hub_tx
        .send(HubRequest::Connect {
            conn_id,
            tx: out_tx,
        })
        .is_err()
    {
        return;
    }
    let writer_handle = tokio::spawn(writer_task(writer, out_rx));

    // Read loop
    loop {
        match read_frame::<_, ClientIntent>(&mut reader).await {
            Ok(intent) => {
                if hub_tx.send(HubRequest::Intent { conn_id, intent }).is_err() {
                    break;
                }
            }
            Err(Error::ConnectionClosed) => {
                debug!(%conn_id, "connection closed");
                break;
            }
            Err(e) => {
                warn!(%conn_id, error = %e, "read error");
                break;
            }
        }
    }

    // Cleanup
    let _ = hub_tx.send(HubRequest::Disconnect { conn_id });
    writer_handle.abort();
}

/// Writer task - sends events to the client
async fn writer_task(mut writer: tokio::io::WriteHalf<TcpStream>, mut rx: OutboundRx) {
    while let Some(event) = rx.recv().await {
        if let Err(e) = write_frame(&mut writer, &event).await {
            debug!(error = %e, "write failed");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use crate::protocol::ServerEvent;
    use plaza_core::game::EndReason;
    use std::time::Duration;

    async fn start_server() -> Server {
        Server::start(
            "127.0.0.1:0".parse().unwrap(),
            DEFAULT_MAX_CONNECTIONS,
            None,
        )
        .await
        .unwrap()
    }

    /// Wait for the first event matching the predicate, skipping others.
    async fn wait_for<F>(client: &mut Client, mut matches: F) -> ServerEvent
    where
        F: FnMut(&ServerEvent) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let event = client.next_event().await.expect("connection closed");
                if matches(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("timed out waiting for event")
    }

    #[tokio::test]
    async fn test_server_start() {
        let server = start_server().await;
        assert!(server.addr().port() > 0);
        server.shutdown();
    }

    #[tokio::test]
    async fn test_login_over_tcp() {
        let server = start_server().await;
        let mut client = Client::connect(server.addr()).await.unwrap();
        client.login("alice").await.unwrap();

        let event = wait_for(&mut client, |e| {
            matches!(e, ServerEvent::LoginSuccess { .. })
        })
        .await;
        match event {
            ServerEvent::LoginSuccess { name, plaza, .. } => {
                assert_eq!(name, "alice");
                assert_eq!(plaza.players.len(), 1);
            }
            _ => unreachable!(),
        }
        server.shutdown();
    }

    #[tokio::test]
    async fn test_two_player_game_over_tcp() {
        let server = start_server().await;

        let mut alice = Client::connect(server.addr()).await.unwrap();
        alice.login("alice").await.unwrap();
        let ServerEvent::LoginSuccess { self_id: a, .. } =
            wait_for(&mut alice, |e| matches!(e, ServerEvent::LoginSuccess { .. })).await
        else {
            unreachable!()
        };

        let mut bob = Client::connect(server.addr()).await.unwrap();
        bob.login("bob").await.unwrap();
        wait_for(&mut bob, |e| matches!(e, ServerEvent::LoginSuccess { .. })).await;

        alice
            .send(ClientIntent::CreateRoom { name: "den".into() })
            .await
            .unwrap();
        let ServerEvent::RoomJoined { room_id } =
            wait_for(&mut alice, |e| matches!(e, ServerEvent::RoomJoined { .. })).await
        else {
            unreachable!()
        };

        bob.send(ClientIntent::JoinRoom { room_id }).await.unwrap();
        wait_for(&mut bob, |e| matches!(e, ServerEvent::RoomJoined { .. })).await;

        alice
            .send(ClientIntent::StartWordGame { room_id })
            .await
            .unwrap();
        let started = wait_for(&mut bob, |e| {
            matches!(e, ServerEvent::WordGameStarted { .. })
        })
        .await;
        if let ServerEvent::WordGameStarted { state, .. } = started {
            assert_eq!(state.word_game.current_turn_id, Some(a));
            assert_eq!(state.word_game.round, 1);
        }

        // Play all three rounds to a clean finish.
        let script = [
            ("a", "사과"),
            ("b", "과일"),
            ("a", "일곱"),
            ("b", "곱창"),
            ("a", "창문"),
            ("b", "문어"),
        ];
        for (who, word) in script {
            let sender = if who == "a" { &alice } else { &bob };
            sender
                .send(ClientIntent::SubmitWord {
                    room_id,
                    word: word.to_string(),
                })
                .await
                .unwrap();
            // Everyone sees the acceptance before anything else happens.
            wait_for(&mut alice, |e| {
                matches!(e, ServerEvent::WordSubmitted { word: w, .. } if *w == word)
            })
            .await;
        }

        let ended = wait_for(&mut alice, |e| {
            matches!(e, ServerEvent::WordGameEnded { .. })
        })
        .await;
        match ended {
            ServerEvent::WordGameEnded {
                reason, winner_id, ..
            } => {
                assert_eq!(reason, EndReason::RoundsComplete);
                assert_eq!(winner_id, Some(a));
            }
            _ => unreachable!(),
        }

        server.shutdown();
    }

    #[tokio::test]
    async fn test_disconnect_cascades_to_plaza() {
        let server = start_server().await;

        let mut alice = Client::connect(server.addr()).await.unwrap();
        alice.login("alice").await.unwrap();
        wait_for(&mut alice, |e| matches!(e, ServerEvent::LoginSuccess { .. })).await;

        let mut bob = Client::connect(server.addr()).await.unwrap();
        bob.login("bob").await.unwrap();
        let join = wait_for(&mut alice, |e| matches!(e, ServerEvent::PlazaJoin(_))).await;
        let ServerEvent::PlazaJoin(player) = join else {
            unreachable!()
        };

        drop(bob);
        let left = wait_for(&mut alice, |e| matches!(e, ServerEvent::PlazaLeave { .. })).await;
        match left {
            ServerEvent::PlazaLeave { id } => assert_eq!(id, player.id),
            _ => unreachable!(),
        }

        server.shutdown();
    }
}
