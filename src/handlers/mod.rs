//! Envelope handlers.
//!
//! The [`Router`] maps each inbound `type` to a [`Handler`]. Handlers receive
//! the decoded [`Inbound`](chatter_proto::Inbound) by value and deliver through
//! the fan-out helpers, which never wait on a slow client.

pub mod core;
pub mod helpers;
mod messaging;
mod presence;
mod receipts;
mod users;

pub use self::core::{Context, Handler, Router};
pub use messaging::{PrivateMessageHandler, PublicMessageHandler};
pub use presence::TypingHandler;
pub use receipts::ReadReceiptHandler;
pub use users::UserListHandler;
