//! Per-command connections to the fleet.
//!
//! Every command opens a fresh connection to each configured server. A
//! server that cannot be reached is recorded as absent and the command
//! proceeds over the connected subset. Every receive carries a timeout so
//! a wedged server cannot hang the REPL; piece payloads get a longer
//! allowance than control frames.

use std::time::Duration;

use dfp_core::ClientConfig;
use dfp_protocol::{
    self as wire, Envelope, PieceFrame, PieceReport, Signal, WireError, STATUS_ERR,
};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Receive timeout for control frames.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Receive timeout for a whole piece frame; piece transfers may
/// legitimately outlast the control timeout.
pub const PIECE_TIMEOUT: Duration = Duration::from_secs(60);

/// Session-level failures on one connection.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("receive timed out")]
    Timeout,

    #[error(transparent)]
    Wire(#[from] WireError),
}

/// A per-server error surfaced to the user.
#[derive(Debug, Clone)]
pub struct ServerFault {
    pub server: String,
    pub message: String,
}

/// One live connection to a configured server.
#[derive(Debug)]
pub struct ServerLink {
    /// Index into the configured server list; selects the placement column.
    pub index: usize,
    pub name: String,
    stream: TcpStream,
}

impl ServerLink {
    pub async fn read_int(&mut self) -> Result<i32, SessionError> {
        timeout(RECV_TIMEOUT, wire::read_int(&mut self.stream))
            .await
            .map_err(|_| SessionError::Timeout)?
            .map_err(Into::into)
    }

    pub async fn read_frame(&mut self, max: usize) -> Result<Vec<u8>, SessionError> {
        timeout(RECV_TIMEOUT, wire::read_frame(&mut self.stream, max))
            .await
            .map_err(|_| SessionError::Timeout)?
            .map_err(Into::into)
    }

    pub async fn read_report(&mut self) -> Result<PieceReport, SessionError> {
        timeout(RECV_TIMEOUT, PieceReport::receive(&mut self.stream))
            .await
            .map_err(|_| SessionError::Timeout)?
            .map_err(Into::into)
    }

    pub async fn read_piece(&mut self) -> Result<PieceFrame, SessionError> {
        timeout(PIECE_TIMEOUT, PieceFrame::receive(&mut self.stream))
            .await
            .map_err(|_| SessionError::Timeout)?
            .map_err(Into::into)
    }

    pub async fn read_error_frame(&mut self) -> Result<String, SessionError> {
        timeout(RECV_TIMEOUT, wire::read_error_frame(&mut self.stream))
            .await
            .map_err(|_| SessionError::Timeout)?
            .map_err(Into::into)
    }

    pub async fn write_int(&mut self, value: i32) -> Result<(), SessionError> {
        wire::write_int(&mut self.stream, value)
            .await
            .map_err(Into::into)
    }

    pub async fn write_signal(&mut self, signal: Signal) -> Result<(), SessionError> {
        wire::write_signal(&mut self.stream, signal)
            .await
            .map_err(Into::into)
    }

    pub async fn send_envelope(&mut self, envelope: &Envelope) -> Result<(), SessionError> {
        envelope.send(&mut self.stream).await.map_err(Into::into)
    }

    pub async fn send_piece(&mut self, id: i32, payload: &[u8]) -> Result<(), SessionError> {
        PieceFrame::send(&mut self.stream, id, payload)
            .await
            .map_err(Into::into)
    }
}

/// Connections for one command, index-aligned with the configured servers.
#[derive(Debug)]
pub struct Fleet {
    links: Vec<Option<ServerLink>>,
}

impl Fleet {
    /// Connect to every configured server; failures leave a gap.
    pub async fn connect(config: &ClientConfig) -> Self {
        let mut links = Vec::with_capacity(config.servers.len());
        for (index, server) in config.servers.iter().enumerate() {
            let attempt = timeout(RECV_TIMEOUT, TcpStream::connect(server.endpoint())).await;
            match attempt {
                Ok(Ok(stream)) => {
                    debug!(server = %server.name, "connected");
                    links.push(Some(ServerLink {
                        index,
                        name: server.name.clone(),
                        stream,
                    }));
                }
                Ok(Err(err)) => {
                    warn!(server = %server.name, %err, "connection failed");
                    links.push(None);
                }
                Err(_) => {
                    warn!(server = %server.name, "connection timed out");
                    links.push(None);
                }
            }
        }
        Self { links }
    }

    /// Number of live connections.
    #[must_use]
    pub fn connected(&self) -> usize {
        self.links.iter().flatten().count()
    }

    /// Mutable access to every slot, live or not.
    pub fn slots_mut(&mut self) -> &mut [Option<ServerLink>] {
        &mut self.links
    }

    /// Send the command envelope to every live server; a link that cannot
    /// be written to is dropped with a warning.
    pub async fn broadcast_envelope(&mut self, envelope: &Envelope) {
        for slot in &mut self.links {
            let Some(link) = slot else { continue };
            if let Err(err) = link.send_envelope(envelope).await {
                warn!(server = %link.name, %err, "failed to send command");
                *slot = None;
            }
        }
    }

    /// Read the dispatch status from every live server. A `-1` status
    /// consumes the error frame, surfaces it as a fault and drops the
    /// link (the server closes after an error).
    pub async fn collect_statuses(&mut self) -> Vec<ServerFault> {
        let mut faults = Vec::new();
        for slot in &mut self.links {
            let Some(link) = slot else { continue };
            match link.read_int().await {
                Ok(STATUS_ERR) => {
                    let message = link
                        .read_error_frame()
                        .await
                        .unwrap_or_else(|err| format!("error frame unreadable: {err}"));
                    faults.push(ServerFault {
                        server: link.name.clone(),
                        message,
                    });
                    *slot = None;
                }
                Ok(_) => {}
                Err(err) => {
                    faults.push(ServerFault {
                        server: link.name.clone(),
                        message: err.to_string(),
                    });
                    *slot = None;
                }
            }
        }
        faults
    }

    /// Send a signal to every live server, ignoring write failures; the
    /// peers may already have closed.
    pub async fn broadcast_signal(&mut self, signal: Signal) {
        for link in self.links.iter_mut().flatten() {
            let _ = link.write_signal(signal).await;
        }
    }
}
