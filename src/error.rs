//! Unified error handling for chatterd.
//!
//! Handlers return [`HandlerError`]; the router turns it into a metric label
//! and, for the few errors the client should hear about, an error envelope
//! addressed to the sender only.

use chatter_proto::{Outbound, ProtocolError};
use thiserror::Error;

use crate::history::StorageError;

/// Error code carried by the envelope sent when a message could not be stored.
pub const STORAGE_UNAVAILABLE: &str = "storage_unavailable";

// ============================================================================
// Handler Errors (envelope processing)
// ============================================================================

/// Errors that can occur while handling one envelope.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The sender's own outbound queue is gone (connection tearing down).
    #[error("sender queue closed")]
    QueueClosed,

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Protocol(e) => e.reason(),
            Self::Storage(_) => STORAGE_UNAVAILABLE,
            Self::QueueClosed => "queue_closed",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Convert to a client-visible error envelope.
    ///
    /// Returns `None` for errors that don't warrant a reply: malformed input is
    /// dropped silently and internal failures are only logged.
    pub fn to_envelope(&self) -> Option<Outbound> {
        match self {
            Self::Storage(_) => Some(Outbound::error(
                STORAGE_UNAVAILABLE,
                "Your message could not be saved and was not delivered",
            )),
            Self::Protocol(_) | Self::QueueClosed | Self::Internal(_) => None,
        }
    }
}

/// Result type for envelope handlers.
pub type HandlerResult = Result<(), HandlerError>;

// DbError stays in db/mod.rs next to sqlx; StorageError in history/mod.rs.
