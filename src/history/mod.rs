//! Message storage abstraction.
//!
//! Public and private messages are appended before they are delivered. If the
//! append fails the delivery does not happen and only the sender hears about it.

use async_trait::async_trait;
use thiserror::Error;

pub mod noop;
pub mod sqlite;

pub use noop::NoOpStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Store a public message. Returns the generated id.
    async fn append_public(&self, sender_id: i64, text: &str) -> Result<i64, StorageError>;

    /// Store a private message. The recipient need not be online or known.
    async fn append_private(
        &self,
        sender_id: i64,
        recipient_id: i64,
        text: &str,
    ) -> Result<i64, StorageError>;
}
