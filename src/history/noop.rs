//! No-op store that discards all messages.
//!
//! Used when `history.backend = "none"`. Appends always succeed and hand out
//! sequential ids so callers see the same shape as the SQLite store.

use super::{HistoryStore, StorageError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug, Default)]
pub struct NoOpStore {
    next_id: AtomicI64,
}

impl NoOpStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl HistoryStore for NoOpStore {
    async fn append_public(&self, _sender_id: i64, _text: &str) -> Result<i64, StorageError> {
        Ok(self.next())
    }

    async fn append_private(
        &self,
        _sender_id: i64,
        _recipient_id: i64,
        _text: &str,
    ) -> Result<i64, StorageError> {
        Ok(self.next())
    }
}
