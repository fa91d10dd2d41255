//! # chatter-proto
//!
//! Wire types for the chatterd realtime chat protocol.
//!
//! Clients and the server exchange JSON objects over a WebSocket. Every
//! inbound object carries a `type` discriminator; outbound objects are either
//! plain chat lines (`{message, sender}`) or typed events.
//!
//! ## Features
//!
//! - Strict decoding of inbound envelopes with a distinct `Unrecognized` variant
//! - Outbound envelope construction and encoding
//! - WebSocket upgrade helpers (path/query/cookie extraction, origin checks)
//!
//! ## Quick Start
//!
//! ```rust
//! use chatter_proto::{Inbound, Outbound};
//!
//! let env: Inbound = r#"{"type":"public_message","message":"hi"}"#.parse().unwrap();
//! assert_eq!(env, Inbound::PublicMessage { message: "hi".into() });
//!
//! let reply = Outbound::chat("Alice says: hi", "Alice");
//! assert_eq!(reply.encode().unwrap(), r#"{"message":"Alice says: hi","sender":"Alice"}"#);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod inbound;
pub mod outbound;
#[cfg(feature = "tokio")]
pub mod websocket;

pub use self::error::ProtocolError;
pub use self::inbound::{Inbound, kinds};
pub use self::outbound::{Event, Outbound, SELF_SENDER, SYSTEM_SENDER, UserEntry};
