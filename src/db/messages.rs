//! Message repository.
//!
//! Append-only; the server never reads messages back while routing.

use super::DbError;
use sqlx::SqlitePool;

/// Repository for public and private messages.
pub struct MessageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new message repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a public message and return its id.
    pub async fn insert_public(&self, sender_id: i64, content: &str) -> Result<i64, DbError> {
        let result = sqlx::query("INSERT INTO public_messages (sender_id, content) VALUES (?, ?)")
            .bind(sender_id)
            .bind(content)
            .execute(self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Store a private message and return its id.
    pub async fn insert_private(
        &self,
        sender_id: i64,
        recipient_id: i64,
        content: &str,
    ) -> Result<i64, DbError> {
        let result = sqlx::query(
            "INSERT INTO private_messages (sender_id, recipient_id, content) VALUES (?, ?, ?)",
        )
        .bind(sender_id)
        .bind(recipient_id)
        .bind(content)
        .execute(self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }
}
