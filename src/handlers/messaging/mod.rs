//! Messaging handlers.
//!
//! Public and private chat lines. Both are stored before they are delivered;
//! if the store refuses, nobody but the sender hears about it.

mod private;
mod public;

pub use private::PrivateMessageHandler;
pub use public::PublicMessageHandler;
