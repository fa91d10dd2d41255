//! Directory of live sessions.
//!
//! A single mutex-guarded list in registration order. Readers take a snapshot
//! (a copy of the `Arc` handles) and iterate that, so delivery never holds the
//! lock and a session leaving mid-broadcast cannot disturb the iteration.

use parking_lot::Mutex;
use std::sync::Arc;

use super::session::Session;
use super::uid::ConnId;

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    sessions: Mutex<Vec<Arc<Session>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session. Client id and name are not checked for uniqueness.
    ///
    /// Registering a handle that is already present replaces the old entry in
    /// place, so each handle appears at most once.
    pub fn register(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        let len = {
            let mut sessions = self.sessions.lock();
            match sessions.iter_mut().find(|s| s.conn() == session.conn()) {
                Some(slot) => *slot = Arc::clone(&session),
                None => sessions.push(Arc::clone(&session)),
            }
            sessions.len()
        };
        crate::metrics::set_connected_sessions(len);
        session
    }

    /// Remove the session with this handle. Calling it again is a no-op.
    pub fn unregister(&self, conn: ConnId) -> Option<Arc<Session>> {
        let (removed, len) = {
            let mut sessions = self.sessions.lock();
            let removed = sessions
                .iter()
                .position(|s| s.conn() == conn)
                .map(|idx| sessions.remove(idx));
            (removed, sessions.len())
        };
        if removed.is_some() {
            crate::metrics::set_connected_sessions(len);
        }
        removed
    }

    /// Point-in-time copy in registration order.
    pub fn snapshot(&self) -> Vec<Arc<Session>> {
        self.sessions.lock().clone()
    }

    /// First session registered with this client id.
    pub fn find_by_client_id(&self, client_id: i64) -> Option<Arc<Session>> {
        self.sessions
            .lock()
            .iter()
            .find(|s| s.client_id() == client_id)
            .cloned()
    }

    /// First session registered with exactly this display name.
    pub fn find_by_name(&self, name: &str) -> Option<Arc<Session>> {
        self.sessions
            .lock()
            .iter()
            .find(|s| s.name() == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
