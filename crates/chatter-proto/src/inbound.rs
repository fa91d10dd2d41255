//! Inbound envelopes (client to server).

use std::str::FromStr;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ProtocolError, Result};

/// Wire names of the inbound `type` discriminator.
pub mod kinds {
    /// Chat line for everyone.
    pub const PUBLIC_MESSAGE: &str = "public_message";
    /// Direct message to one client id.
    pub const PRIVATE_MESSAGE: &str = "private_message";
    /// Sender started typing.
    pub const TYPING: &str = "typing";
    /// Sender stopped typing.
    pub const STOP_TYPING: &str = "stop_typing";
    /// Sender has read a message from another user.
    pub const READ_RECEIPT: &str = "read_receipt";
    /// Request for the list of online users.
    pub const GET_USER_LIST: &str = "get_user_list";
}

/// A decoded client envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// `{"type":"public_message","message":...}`
    PublicMessage {
        /// Chat text.
        message: String,
    },
    /// `{"type":"private_message","recipient_id":...,"message":...}`
    PrivateMessage {
        /// Client id of the intended recipient.
        recipient_id: i64,
        /// Chat text.
        message: String,
    },
    /// `{"type":"typing"}`
    Typing,
    /// `{"type":"stop_typing"}`
    StopTyping,
    /// `{"type":"read_receipt","original_sender":...,"message":...}`
    ReadReceipt {
        /// Display name of the author of the message that was read.
        original_sender: String,
        /// The message that was read.
        message: String,
    },
    /// `{"type":"get_user_list"}`
    GetUserList,
    /// Any other `type` value. Carries the tag as received.
    Unrecognized(String),
}

#[derive(Deserialize)]
struct PublicBody {
    message: String,
}

#[derive(Deserialize)]
struct PrivateBody {
    recipient_id: i64,
    message: String,
}

#[derive(Deserialize)]
struct ReceiptBody {
    original_sender: String,
    message: String,
}

fn decode<T: DeserializeOwned>(kind: &'static str, fields: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|source| ProtocolError::InvalidField { kind, source })
}

impl Inbound {
    /// Parse a raw text frame.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).map_err(ProtocolError::MalformedJson)?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON value.
    ///
    /// Fields not named by the envelope kind are ignored.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(ProtocolError::NotAnObject);
        };

        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            _ => return Err(ProtocolError::MissingType),
        };

        let envelope = match kind.as_str() {
            kinds::PUBLIC_MESSAGE => {
                let body: PublicBody = decode(kinds::PUBLIC_MESSAGE, fields)?;
                Self::PublicMessage {
                    message: body.message,
                }
            }
            kinds::PRIVATE_MESSAGE => {
                let body: PrivateBody = decode(kinds::PRIVATE_MESSAGE, fields)?;
                Self::PrivateMessage {
                    recipient_id: body.recipient_id,
                    message: body.message,
                }
            }
            kinds::TYPING => Self::Typing,
            kinds::STOP_TYPING => Self::StopTyping,
            kinds::READ_RECEIPT => {
                let body: ReceiptBody = decode(kinds::READ_RECEIPT, fields)?;
                Self::ReadReceipt {
                    original_sender: body.original_sender,
                    message: body.message,
                }
            }
            kinds::GET_USER_LIST => Self::GetUserList,
            _ => Self::Unrecognized(kind),
        };

        Ok(envelope)
    }

    /// The wire `type` of this envelope.
    pub fn kind(&self) -> &str {
        match self {
            Self::PublicMessage { .. } => kinds::PUBLIC_MESSAGE,
            Self::PrivateMessage { .. } => kinds::PRIVATE_MESSAGE,
            Self::Typing => kinds::TYPING,
            Self::StopTyping => kinds::STOP_TYPING,
            Self::ReadReceipt { .. } => kinds::READ_RECEIPT,
            Self::GetUserList => kinds::GET_USER_LIST,
            Self::Unrecognized(kind) => kind,
        }
    }

    /// Whether this envelope carries a known `type`.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl FromStr for Inbound {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_kind() {
        let cases = [
            (
                r#"{"type":"public_message","message":"hi"}"#,
                Inbound::PublicMessage { message: "hi".into() },
            ),
            (
                r#"{"type":"private_message","recipient_id":2,"message":"secret"}"#,
                Inbound::PrivateMessage { recipient_id: 2, message: "secret".into() },
            ),
            (r#"{"type":"typing"}"#, Inbound::Typing),
            (r#"{"type":"stop_typing"}"#, Inbound::StopTyping),
            (
                r#"{"type":"read_receipt","original_sender":"Bob","message":"yo"}"#,
                Inbound::ReadReceipt { original_sender: "Bob".into(), message: "yo".into() },
            ),
            (r#"{"type":"get_user_list"}"#, Inbound::GetUserList),
        ];

        for (raw, expected) in cases {
            let parsed = Inbound::parse(raw).unwrap();
            assert_eq!(parsed, expected, "raw: {raw}");
            assert!(parsed.is_recognized());
        }
    }

    #[test]
    fn unknown_kind_is_unrecognized_not_error() {
        let env = Inbound::parse(r#"{"type":"wave","at":"Bob"}"#).unwrap();
        assert_eq!(env, Inbound::Unrecognized("wave".into()));
        assert_eq!(env.kind(), "wave");
        assert!(!env.is_recognized());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let env = Inbound::parse(r#"{"type":"typing","message":"ignored","n":3}"#).unwrap();
        assert_eq!(env, Inbound::Typing);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = Inbound::parse("{not json").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedJson(_)));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(matches!(Inbound::parse("[1,2]"), Err(ProtocolError::NotAnObject)));
        assert!(matches!(Inbound::parse("\"typing\""), Err(ProtocolError::NotAnObject)));
    }

    #[test]
    fn missing_or_non_string_type_is_rejected() {
        assert!(matches!(
            Inbound::parse(r#"{"message":"hi"}"#),
            Err(ProtocolError::MissingType)
        ));
        assert!(matches!(
            Inbound::parse(r#"{"type":7,"message":"hi"}"#),
            Err(ProtocolError::MissingType)
        ));
    }

    #[test]
    fn missing_required_field_names_the_kind() {
        let err = Inbound::parse(r#"{"type":"public_message"}"#).unwrap_err();
        match err {
            ProtocolError::InvalidField { kind, .. } => assert_eq!(kind, kinds::PUBLIC_MESSAGE),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = Inbound::parse(r#"{"type":"read_receipt","message":"x"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidField { kind: kinds::READ_RECEIPT, .. }));
    }

    #[test]
    fn recipient_id_must_be_an_integer() {
        let err = Inbound::parse(r#"{"type":"private_message","recipient_id":"2","message":"x"}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidField { kind: kinds::PRIVATE_MESSAGE, .. }));
    }
}
