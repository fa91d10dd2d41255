//! Connection lifecycle: authentication, join and departure.

use super::event_loop::WRITE_TIMEOUT;
use crate::handlers::helpers::fanout;
use crate::network::TransportError;
use crate::security::{AuthError, Identity};
use crate::state::{Frame, Hub, Session};
use futures_util::StreamExt;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, error, info};

/// Resolve the credential presented at upgrade time.
pub(super) async fn authenticate(
    hub: &Hub,
    credential: Option<&str>,
) -> Result<Identity, AuthError> {
    let credential = credential.ok_or(AuthError::MissingCredential)?;
    hub.identity.verify(credential).await
}

/// Close code sent to a client whose credential was refused.
pub(super) fn refusal_code(err: &AuthError) -> CloseCode {
    match err {
        // Our lookup failed, not their credential.
        AuthError::Lookup(_) => CloseCode::Error,
        _ => CloseCode::Policy,
    }
}

/// Close an unauthenticated socket and wait briefly for the client's reply.
pub(super) async fn refuse(
    mut ws: WebSocketStream<TcpStream>,
    err: &AuthError,
) -> Result<(), TransportError> {
    let frame = CloseFrame {
        code: refusal_code(err),
        reason: Cow::Borrowed(err.reason()),
    };
    ws.close(Some(frame)).await?;

    let drain = async { while let Some(Ok(_)) = ws.next().await {} };
    if tokio::time::timeout(WRITE_TIMEOUT, drain).await.is_err() {
        debug!("Client did not finish close handshake");
    }
    Ok(())
}

/// Register the session and announce it to everyone, the newcomer included.
pub(super) fn join(
    hub: &Hub,
    identity: &Identity,
    client_id: i64,
    name: String,
) -> (Arc<Session>, mpsc::Receiver<Frame>) {
    let (session, outbox) = hub.register(client_id, name);
    info!(
        conn = %session.conn(),
        client_id,
        name = session.name(),
        account = %identity.username,
        online = hub.registry.len(),
        "Client joined"
    );
    announce(hub, format!("{} joined the chat", session.name()));
    (session, outbox)
}

/// Unregister first so the leave notice only reaches those who remain.
pub(super) fn depart(hub: &Hub, session: &Session) {
    session.close();
    if hub.registry.unregister(session.conn()).is_none() {
        return;
    }
    let connected_secs = (chrono::Utc::now() - session.connected_at()).num_seconds();
    info!(
        conn = %session.conn(),
        client_id = session.client_id(),
        name = session.name(),
        connected_secs,
        online = hub.registry.len(),
        "Client left"
    );
    announce(hub, format!("{} left the chat", session.name()));
}

/// Runs [`depart`] when dropped, so a session leaves the registry even if
/// its connection task unwinds.
pub(super) struct DepartGuard<'a> {
    hub: &'a Hub,
    session: &'a Session,
}

impl<'a> DepartGuard<'a> {
    pub(super) fn new(hub: &'a Hub, session: &'a Session) -> Self {
        Self { hub, session }
    }
}

impl Drop for DepartGuard<'_> {
    fn drop(&mut self) {
        depart(self.hub, self.session);
    }
}

fn announce(hub: &Hub, text: String) {
    if let Err(e) = fanout::notice(hub, text) {
        error!(error = %e, "Failed to encode notice");
    }
}
