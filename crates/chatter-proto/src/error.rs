//! Error types for the chat protocol library.
//!
//! Every way an inbound frame can fail to become an [`Inbound`](crate::Inbound)
//! maps to one [`ProtocolError`] variant. Servers drop the frame and keep the
//! connection open; the variant only decides how the failure is reported.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// The frame was not valid JSON.
    #[error("malformed json: {0}")]
    MalformedJson(#[source] serde_json::Error),

    /// The frame was JSON but not an object.
    #[error("envelope is not a json object")]
    NotAnObject,

    /// The object has no `type` field, or it is not a string.
    #[error("envelope has no string `type` field")]
    MissingType,

    /// A known envelope kind is missing a required field or has one of the wrong type.
    #[error("invalid `{kind}` envelope: {source}")]
    InvalidField {
        /// The envelope kind that failed to decode.
        kind: &'static str,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },

    /// The frame exceeded the configured size limit and was not parsed.
    #[error("frame of {len} bytes exceeds limit of {limit}")]
    FrameTooLarge {
        /// Size of the rejected frame.
        len: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// A binary WebSocket frame arrived; the protocol is text-only.
    #[error("binary frames are not supported")]
    BinaryFrame,

    /// An outbound envelope could not be serialized.
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ProtocolError {
    /// Static reason label, suitable for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MalformedJson(_) => "malformed_json",
            Self::NotAnObject => "not_an_object",
            Self::MissingType => "missing_type",
            Self::InvalidField { .. } => "invalid_field",
            Self::FrameTooLarge { .. } => "frame_too_large",
            Self::BinaryFrame => "binary_frame",
            Self::Encode(_) => "encode",
        }
    }
}
