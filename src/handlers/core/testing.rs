//! In-process fixtures for handler tests: a hub with a recording store and
//! sessions whose queues the test drains directly.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

use crate::config::LimitsConfig;
use crate::history::{HistoryStore, StorageError};
use crate::security::{AuthError, Identity, IdentityGateway};
use crate::state::{Frame, Hub, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stored {
    Public { sender_id: i64, text: String },
    Private { sender_id: i64, recipient_id: i64, text: String },
}

#[derive(Default)]
pub struct RecordingStore {
    pub rows: Mutex<Vec<Stored>>,
    pub fail: AtomicBool,
}

impl RecordingStore {
    fn push(&self, row: Stored) -> Result<i64, StorageError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(StorageError::Unavailable("disk on fire".into()));
        }
        let mut rows = self.rows.lock();
        rows.push(row);
        Ok(rows.len() as i64)
    }
}

#[async_trait]
impl HistoryStore for RecordingStore {
    async fn append_public(&self, sender_id: i64, text: &str) -> Result<i64, StorageError> {
        self.push(Stored::Public {
            sender_id,
            text: text.to_string(),
        })
    }

    async fn append_private(
        &self,
        sender_id: i64,
        recipient_id: i64,
        text: &str,
    ) -> Result<i64, StorageError> {
        self.push(Stored::Private {
            sender_id,
            recipient_id,
            text: text.to_string(),
        })
    }
}

struct RejectAll;

#[async_trait]
impl IdentityGateway for RejectAll {
    async fn verify(&self, _credential: &str) -> Result<Identity, AuthError> {
        Err(AuthError::InvalidToken("test hub".into()))
    }
}

pub struct TestHub {
    pub hub: Arc<Hub>,
    pub store: Arc<RecordingStore>,
}

impl TestHub {
    pub fn new() -> Self {
        Self::with_queue(64)
    }

    pub fn with_queue(send_queue: usize) -> Self {
        let store = Arc::new(RecordingStore::default());
        let limits = LimitsConfig {
            send_queue,
            ..LimitsConfig::default()
        };
        let hub = Hub::new("chat.test", limits, store.clone(), Arc::new(RejectAll));
        Self {
            hub: Arc::new(hub),
            store,
        }
    }

    pub fn fail_storage(&self) {
        self.store.fail.store(true, Ordering::Relaxed);
    }

    pub fn connect(&self, client_id: i64, name: &str) -> (Arc<Session>, mpsc::Receiver<Frame>) {
        self.hub.register(client_id, name.to_string())
    }

    pub fn stored(&self) -> Vec<Stored> {
        self.store.rows.lock().clone()
    }
}

/// Identity whose account id differs from any client id used in tests.
pub fn identity(id: i64, username: &str) -> Identity {
    Identity {
        id,
        username: username.to_string(),
    }
}

/// Everything queued so far, parsed as JSON.
pub fn drain(rx: &mut mpsc::Receiver<Frame>) -> Vec<Value> {
    let mut out = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        out.push(serde_json::from_str(&frame).unwrap_or(Value::Null));
    }
    out
}
