//! One live connection as seen by the rest of the server.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::warn;

use super::uid::ConnId;

/// An encoded outbound envelope, shared across every recipient of a fan-out.
pub type Frame = Arc<str>;

/// Outcome of queueing one frame for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// Queue full: frame dropped and the session told to close.
    SlowConsumer,
    /// Connection already tearing down.
    Closed,
}

/// A registered connection. Immutable once created.
#[derive(Debug)]
pub struct Session {
    conn: ConnId,
    client_id: i64,
    name: String,
    connected_at: DateTime<Utc>,
    outbox: mpsc::Sender<Frame>,
    closer: CancellationToken,
}

impl Session {
    pub fn new(
        conn: ConnId,
        client_id: i64,
        name: String,
        outbox: mpsc::Sender<Frame>,
        closer: CancellationToken,
    ) -> Self {
        Self {
            conn,
            client_id,
            name,
            connected_at: Utc::now(),
            outbox,
            closer,
        }
    }

    pub fn conn(&self) -> ConnId {
        self.conn
    }

    pub fn client_id(&self) -> i64 {
        self.client_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Queue a frame without waiting.
    ///
    /// A full queue means the client is not keeping up; it is disconnected
    /// rather than allowed to stall the sender.
    pub fn deliver(&self, frame: Frame) -> Delivery {
        match self.outbox.try_send(frame) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => {
                if !self.closer.is_cancelled() {
                    warn!(conn = %self.conn, client_id = self.client_id, name = %self.name, "Send queue exceeded, disconnecting");
                    crate::metrics::inc_slow_consumer();
                }
                self.closer.cancel();
                Delivery::SlowConsumer
            }
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Ask the owning connection task to shut down.
    pub fn close(&self) {
        self.closer.cancel();
    }

    pub fn is_closing(&self) -> bool {
        self.closer.is_cancelled()
    }

    /// Resolves once [`Session::close`] has been called or the queue overflowed.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.closer.cancelled()
    }
}
