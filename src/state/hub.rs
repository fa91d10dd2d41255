//! Shared server state handed to every connection and handler.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::registry::ConnectionRegistry;
use super::session::{Frame, Session};
use super::uid::{ConnId, ConnIdGenerator};
use crate::config::LimitsConfig;
use crate::history::HistoryStore;
use crate::security::IdentityGateway;

pub struct Hub {
    /// Server name from config, tagged on every connection span.
    pub server_name: String,
    pub registry: ConnectionRegistry,
    pub history: Arc<dyn HistoryStore>,
    pub identity: Arc<dyn IdentityGateway>,
    pub limits: LimitsConfig,
    conn_ids: ConnIdGenerator,
}

impl Hub {
    pub fn new(
        server_name: impl Into<String>,
        limits: LimitsConfig,
        history: Arc<dyn HistoryStore>,
        identity: Arc<dyn IdentityGateway>,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            registry: ConnectionRegistry::new(),
            history,
            identity,
            limits,
            conn_ids: ConnIdGenerator::new(),
        }
    }

    pub fn next_conn_id(&self) -> ConnId {
        self.conn_ids.next()
    }

    /// Create a session with a fresh bounded queue and register it.
    ///
    /// The caller owns the receiving half and drains it to the socket.
    pub fn register(&self, client_id: i64, name: String) -> (Arc<Session>, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(self.limits.send_queue.max(1));
        let session = Session::new(
            self.next_conn_id(),
            client_id,
            name,
            tx,
            CancellationToken::new(),
        );
        (self.registry.register(session), rx)
    }
}
