//! DFP storage server: accept loop and per-connection command handling.
//!
//! Each accepted connection performs exactly one command cycle
//! (authenticate, dispatch, run the command's sub-protocol) and terminates.
//! Workers share only the immutable configuration and the store root; there
//! is no cross-connection state.

#![forbid(unsafe_code)]

mod connection;

use std::sync::Arc;

use dfp_core::ServerConfig;
use dfp_protocol::WireError;
use dfp_store::{PieceStore, StoreError};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::warn;

/// Immutable state shared by all connection workers.
#[derive(Debug)]
pub struct ServerState {
    pub store: PieceStore,
    pub config: ServerConfig,
}

/// Why a connection worker stopped early.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Run the accept loop forever, spawning one worker task per connection.
///
/// # Errors
/// Never returns `Ok`; accept failures are logged and retried, so an error
/// here means the listener itself is gone.
pub async fn serve(listener: TcpListener, state: Arc<ServerState>) -> std::io::Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(%err, "accept failed");
                continue;
            }
        };
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(err) = connection::handle(stream, state).await {
                warn!(%peer, %err, "connection ended with error");
            }
        });
    }
}
