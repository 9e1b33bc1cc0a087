//! Duplex WebSocket client for the conversational agent
//!
//! `connect` returns a pending handle immediately; connection progress and
//! all inbound traffic arrive as [`ClientEvent`]s on a channel, so the
//! session controller runs a plain consume-and-branch loop instead of
//! registering nested callbacks.

use crate::audio::WireAudioPacket;
use crate::client::messages::{ClientMessage, ServerEvent};
use crate::error::{SessionError, SessionResult};
use crate::session::AgentEndpoint;
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Lifecycle of the underlying connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Opening,
    Open,
    Closed,
}

impl ConnectionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ConnectionState::Disconnected,
            1 => ConnectionState::Opening,
            2 => ConnectionState::Open,
            _ => ConnectionState::Closed,
        }
    }
}

/// Connection state shared between the handle and the transport task.
#[derive(Clone)]
pub struct ConnectionStateCell(Arc<AtomicU8>);

impl ConnectionStateCell {
    pub fn new(state: ConnectionState) -> Self {
        Self(Arc::new(AtomicU8::new(state as u8)))
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

/// Connection events consumed by the session controller.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// The connection is open and audio may flow
    Open,
    /// A parsed inbound message
    Server(ServerEvent),
    /// The transport failed; the connection is gone
    TransportError(String),
    /// The server closed the connection in an orderly way
    Closed,
}

/// Commands handed to the transport writer.
#[derive(Debug)]
pub enum Outbound {
    Audio(ClientMessage),
    Close,
}

/// Handle to an open (or opening) duplex connection.
///
/// `send` is fire-and-forget: frames are dropped unless the connection is
/// open. There is deliberately no outbound buffering before open.
pub struct DuplexHandle {
    state: ConnectionStateCell,
    out_tx: mpsc::Sender<Outbound>,
}

impl DuplexHandle {
    /// A handle not bound to any transport, for tests and tooling.
    ///
    /// Returns the handle, the stream of outbound commands `send`/`close`
    /// produce, and the shared state cell controlling whether sends pass.
    pub fn detached(
        state: ConnectionState,
    ) -> (Self, mpsc::Receiver<Outbound>, ConnectionStateCell) {
        let cell = ConnectionStateCell::new(state);
        let (out_tx, out_rx) = mpsc::channel(64);
        (
            Self {
                state: cell.clone(),
                out_tx,
            },
            out_rx,
            cell,
        )
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Forward one encoded audio frame; dropped unless the connection is open.
    pub fn send(&self, packet: WireAudioPacket) {
        if self.state() != ConnectionState::Open {
            debug!("audio frame dropped: connection not open");
            return;
        }
        let message = ClientMessage::Audio {
            mime_type: packet.mime_type,
            data: packet.data,
        };
        if self.out_tx.try_send(Outbound::Audio(message)).is_err() {
            debug!("audio frame dropped: writer unavailable");
        }
    }

    /// Request a graceful close. Idempotent; later calls are no-ops.
    pub fn close(&self) {
        if self.state() == ConnectionState::Closed {
            return;
        }
        self.state.set(ConnectionState::Closed);
        let _ = self.out_tx.try_send(Outbound::Close);
    }
}

/// Seam between the session controller and the transport, so tests can feed
/// scripted event sequences without a network.
#[async_trait::async_trait]
pub trait DuplexConnector: Send + Sync {
    async fn connect(
        &self,
        endpoint: &AgentEndpoint,
    ) -> SessionResult<(DuplexHandle, mpsc::Receiver<ClientEvent>)>;
}

/// WebSocket connector against a live agent endpoint.
pub struct WsConnector;

#[async_trait::async_trait]
impl DuplexConnector for WsConnector {
    async fn connect(
        &self,
        endpoint: &AgentEndpoint,
    ) -> SessionResult<(DuplexHandle, mpsc::Receiver<ClientEvent>)> {
        if endpoint.url.is_empty() {
            return Err(SessionError::Connection("agent URL not configured".into()));
        }

        let state = ConnectionStateCell::new(ConnectionState::Opening);
        let (out_tx, out_rx) = mpsc::channel::<Outbound>(64);
        let (event_tx, event_rx) = mpsc::channel::<ClientEvent>(64);

        let handle = DuplexHandle {
            state: state.clone(),
            out_tx,
        };

        tokio::spawn(run_connection(endpoint.clone(), state, out_rx, event_tx));

        Ok((handle, event_rx))
    }
}

async fn run_connection(
    endpoint: AgentEndpoint,
    state: ConnectionStateCell,
    mut out_rx: mpsc::Receiver<Outbound>,
    event_tx: mpsc::Sender<ClientEvent>,
) {
    info!(url = %endpoint.url, "opening duplex connection");

    let ws_stream = match connect_async(endpoint.url.as_str()).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            state.set(ConnectionState::Closed);
            let _ = event_tx
                .send(ClientEvent::TransportError(e.to_string()))
                .await;
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();

    // Session setup goes out before any audio.
    let setup = ClientMessage::Setup {
        session_id: endpoint.session_id.clone(),
        model: endpoint.model.clone(),
        system_instruction: endpoint.system_instruction.clone(),
    };
    if let Ok(json) = serde_json::to_string(&setup) {
        if write.send(Message::Text(json)).await.is_err() {
            state.set(ConnectionState::Closed);
            let _ = event_tx
                .send(ClientEvent::TransportError("setup send failed".into()))
                .await;
            return;
        }
    }

    state.set(ConnectionState::Open);
    let _ = event_tx.send(ClientEvent::Open).await;
    info!("duplex connection open");

    let writer = tokio::spawn(async move {
        while let Some(outbound) = out_rx.recv().await {
            match outbound {
                Outbound::Audio(message) => {
                    let json = match serde_json::to_string(&message) {
                        Ok(j) => j,
                        Err(e) => {
                            warn!("failed to serialize outbound frame: {}", e);
                            continue;
                        }
                    };
                    if write.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    while let Some(result) = read.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                Ok(event) => {
                    let terminal =
                        matches!(event, ServerEvent::Error { .. } | ServerEvent::Closed);
                    if event_tx.send(ClientEvent::Server(event)).await.is_err() {
                        break;
                    }
                    if terminal {
                        break;
                    }
                }
                // Malformed inbound shapes are dropped; the session continues.
                Err(e) => warn!("dropping malformed server message: {}", e),
            },
            Ok(Message::Close(_)) => {
                info!("connection closed by server");
                let _ = event_tx.send(ClientEvent::Closed).await;
                break;
            }
            Ok(_) => {}
            Err(e) => {
                let _ = event_tx
                    .send(ClientEvent::TransportError(e.to_string()))
                    .await;
                break;
            }
        }
    }

    state.set(ConnectionState::Closed);
    writer.abort();
    info!("duplex connection finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_handle(state: ConnectionState) -> (DuplexHandle, mpsc::Receiver<Outbound>) {
        let (handle, out_rx, _) = DuplexHandle::detached(state);
        (handle, out_rx)
    }

    #[test]
    fn test_send_dropped_before_open() {
        let (handle, mut out_rx) = test_handle(ConnectionState::Opening);
        handle.send(WireAudioPacket {
            mime_type: crate::audio::WIRE_MIME_TYPE.to_string(),
            data: "AAAA".to_string(),
        });
        assert!(out_rx.try_recv().is_err());
    }

    #[test]
    fn test_send_forwarded_when_open() {
        let (handle, mut out_rx) = test_handle(ConnectionState::Open);
        handle.send(WireAudioPacket {
            mime_type: crate::audio::WIRE_MIME_TYPE.to_string(),
            data: "AAAA".to_string(),
        });
        assert!(matches!(out_rx.try_recv(), Ok(Outbound::Audio(_))));
    }

    #[test]
    fn test_close_is_idempotent() {
        let (handle, mut out_rx) = test_handle(ConnectionState::Open);
        handle.close();
        handle.close();
        assert_eq!(handle.state(), ConnectionState::Closed);
        assert!(matches!(out_rx.try_recv(), Ok(Outbound::Close)));
        // Second close sent nothing further.
        assert!(out_rx.try_recv().is_err());
    }
}
