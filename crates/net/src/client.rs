//! Thin TCP client for plaza-world servers
//!
//! Enough to drive a server programmatically: connect, send intents,
//! receive events. Used by the integration tests and tooling; the real
//! rendering client lives elsewhere.

use std::net::SocketAddr;

use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::{ClientIntent, ServerEvent};

/// Client handle for one connection
pub struct Client {
    event_rx: mpsc::Receiver<ServerEvent>,
    intent_tx: mpsc::Sender<ClientIntent>,
}

impl Client {
    /// Connect to a server
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = tokio::io::split(stream);

        let (event_tx, event_rx) = mpsc::channel(64);
        let (intent_tx, intent_rx) = mpsc::channel(64);

        tokio::spawn(read_task(reader, event_tx));
        tokio::spawn(write_task(writer, intent_rx));

        Ok(Client {
            event_rx,
            intent_tx,
        })
    }

    /// Queue an intent for sending
    pub async fn send(&self, intent: ClientIntent) -> Result<()> {
        self.intent_tx
            .send(intent)
            .await
            .map_err(|_| Error::NotConnected)
    }

    /// Shorthand for the login intent
    pub async fn login(&self, name: &str) -> Result<()> {
        self.send(ClientIntent::Login {
            name: name.to_string(),
        })
        .await
    }

    /// Next event from the server; `None` once the connection is gone
    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        self.event_rx.recv().await
    }
}

async fn read_task(mut reader: ReadHalf<TcpStream>, event_tx: mpsc::Sender<ServerEvent>) {
    loop {
        tokio::select! {
            result = read_frame::<_, ServerEvent>(&mut reader) => match result {
                Ok(event) => {
                    if event_tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(Error::ConnectionClosed) => {
                    debug!("server closed the connection");
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "read error");
                    break;
                }
            },
            // Dropping the client handle tears the connection down.
            _ = event_tx.closed() => break,
        }
    }
}

async fn write_task(mut writer: WriteHalf<TcpStream>, mut intent_rx: mpsc::Receiver<ClientIntent>) {
    while let Some(intent) = intent_rx.recv().await {
        if let Err(e) = write_frame(&mut writer, &intent).await {
            debug!(error = %e, "write failed");
            break;
        }
    }
}
