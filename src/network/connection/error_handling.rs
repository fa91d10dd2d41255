//! Error handling utilities for WebSocket connection management.
//!
//! Classifies transport read errors so the event loop knows whether the
//! peer simply went away, broke the WebSocket protocol, or the socket failed.

use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::error::ProtocolError as WsProtocolError;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

/// Classification of transport read errors for appropriate handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ReadErrorAction {
    /// Peer closed or dropped the socket; nothing worth reporting.
    PeerGone,
    /// Protocol violation at the WebSocket layer; send a close frame and disconnect.
    Fatal { code: CloseCode, reason: &'static str },
    /// I/O error - connection is broken, just log and disconnect.
    IoError,
}

/// Classify a transport read error into an actionable category.
pub(super) fn classify_read_error(e: &WsError) -> ReadErrorAction {
    match e {
        WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Protocol(WsProtocolError::ResetWithoutClosingHandshake) => {
            ReadErrorAction::PeerGone
        }
        WsError::Capacity(_) => ReadErrorAction::Fatal {
            code: CloseCode::Size,
            reason: "frame_too_large",
        },
        WsError::Utf8 => ReadErrorAction::Fatal {
            code: CloseCode::Invalid,
            reason: "invalid_utf8",
        },
        WsError::Protocol(_) | WsError::AttackAttempt => ReadErrorAction::Fatal {
            code: CloseCode::Protocol,
            reason: "websocket_protocol",
        },
        _ => ReadErrorAction::IoError,
    }
}
