//! Network module.
//!
//! Contains the Gateway (WebSocket listener) and the per-client Connection task.

mod connection;
mod gateway;

pub use connection::Connection;
pub use gateway::Gateway;

use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that end a connection task.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("write stalled for {0:?}")]
    WriteTimeout(Duration),
}
