//! SQLite-backed message store.

use super::{HistoryStore, StorageError};
use crate::db::Database;
use async_trait::async_trait;

/// Appends into the `public_messages` and `private_messages` tables.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HistoryStore for SqliteStore {
    async fn append_public(&self, sender_id: i64, text: &str) -> Result<i64, StorageError> {
        Ok(self.db.messages().insert_public(sender_id, text).await?)
    }

    async fn append_private(
        &self,
        sender_id: i64,
        recipient_id: i64,
        text: &str,
    ) -> Result<i64, StorageError> {
        Ok(self
            .db
            .messages()
            .insert_private(sender_id, recipient_id, text)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_land_in_their_tables() {
        let db = Database::new(":memory:").await.unwrap();
        let store = SqliteStore::new(db.clone());

        store.append_public(5, "hello all").await.unwrap();
        store.append_private(5, 404, "anyone there?").await.unwrap();

        let public: Vec<(i64, String)> =
            sqlx::query_as("SELECT sender_id, content FROM public_messages")
                .fetch_all(db.pool())
                .await
                .unwrap();
        assert_eq!(public, vec![(5, "hello all".to_string())]);

        let private: Vec<(i64, i64, String)> =
            sqlx::query_as("SELECT sender_id, recipient_id, content FROM private_messages")
                .fetch_all(db.pool())
                .await
                .unwrap();
        assert_eq!(private, vec![(5, 404, "anyone there?".to_string())]);
    }

    #[tokio::test]
    async fn closed_pool_surfaces_storage_error() {
        let db = Database::new(":memory:").await.unwrap();
        let store = SqliteStore::new(db.clone());
        db.pool().close().await;

        let err = store.append_public(1, "lost").await.unwrap_err();
        assert!(matches!(err, StorageError::Database(_)));
    }
}
