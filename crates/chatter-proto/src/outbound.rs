//! Outbound envelopes (server to client).
//!
//! Two shapes go out on the wire. Chat lines, acknowledgments and system
//! notices are untyped `{message, sender}` objects; everything else is a
//! typed [`Event`] whose `type` field comes first.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// Sender name used for join/leave notices.
pub const SYSTEM_SENDER: &str = "system";

/// Sender name used when echoing a public message back to its author.
pub const SELF_SENDER: &str = "you";

/// One row of a `user_list` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    /// Client id the session connected with.
    pub id: i64,
    /// Display name of the session.
    pub name: String,
}

/// Typed server events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Online users, in registration order.
    UserList {
        /// Connected sessions.
        users: Vec<UserEntry>,
    },
    /// A direct message.
    PrivateMessage {
        /// Display name of the author.
        sender: String,
        /// Chat text.
        message: String,
    },
    /// Someone started typing.
    Typing {
        /// Display name of the typist.
        sender: String,
    },
    /// Someone stopped typing.
    StopTyping {
        /// Display name of the typist.
        sender: String,
    },
    /// Someone read one of your messages.
    ReadReceipt {
        /// Display name of the reader.
        reader: String,
        /// The message that was read.
        message: String,
    },
    /// A request from this client could not be completed.
    Error {
        /// Machine-readable error code.
        code: String,
        /// Human-readable description.
        message: String,
    },
}

/// Anything the server writes to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outbound {
    /// A typed event.
    Typed(Event),
    /// A plain chat line: broadcasts, acknowledgments and system notices.
    Chat {
        /// Rendered text.
        message: String,
        /// Display name of the author, `"you"` or `"system"`.
        sender: String,
    },
}

impl Outbound {
    /// Plain chat line.
    pub fn chat(message: impl Into<String>, sender: impl Into<String>) -> Self {
        Self::Chat {
            message: message.into(),
            sender: sender.into(),
        }
    }

    /// Chat line from the `system` sender.
    pub fn notice(message: impl Into<String>) -> Self {
        Self::chat(message, SYSTEM_SENDER)
    }

    /// `user_list` event.
    pub fn user_list(users: Vec<UserEntry>) -> Self {
        Self::Typed(Event::UserList { users })
    }

    /// `private_message` event.
    pub fn private_message(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Typed(Event::PrivateMessage {
            sender: sender.into(),
            message: message.into(),
        })
    }

    /// `typing` or `stop_typing` event.
    pub fn typing(sender: impl Into<String>, stopped: bool) -> Self {
        let sender = sender.into();
        Self::Typed(if stopped {
            Event::StopTyping { sender }
        } else {
            Event::Typing { sender }
        })
    }

    /// `read_receipt` event.
    pub fn read_receipt(reader: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Typed(Event::ReadReceipt {
            reader: reader.into(),
            message: message.into(),
        })
    }

    /// `error` event.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Typed(Event::Error {
            code: code.into(),
            message: message.into(),
        })
    }

    /// Serialize to a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Parse a frame written by [`Outbound::encode`]. Used by clients and tests.
    pub fn decode(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(ProtocolError::MalformedJson)
    }
}
