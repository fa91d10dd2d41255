//! Connection - Handles an individual client connection.
//!
//! Each Connection runs in its own Tokio task with the following phases:
//!
//! ```text
//! Phase 1: Authenticate (credential captured during the upgrade)
//!    │  refused → close 1008, no session is ever created
//!    ↓
//! Phase 2: Register session, broadcast "<name> joined the chat"
//!    ↓
//! Phase 3: Event loop (tokio::select!)
//!    ┌──────────────────────────────────────────────────┐
//!    │  socket read ──▶ Router ──▶ other sessions' queues│
//!    │  own queue   ──▶ socket write                     │
//!    │  close signal / shutdown ──▶ exit                 │
//!    └──────────────────────────────────────────────────┘
//!    ↓
//! Phase 4: Unregister, broadcast "<name> left the chat"
//! ```

mod error_handling;
mod event_loop;
mod lifecycle;

use crate::handlers::{Context, Router};
use crate::network::TransportError;
use crate::state::Hub;
use chatter_proto::websocket::ConnectParams;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;
use tracing::{Span, debug, field, warn};

/// A client connection handler.
pub struct Connection {
    ws: WebSocketStream<TcpStream>,
    addr: SocketAddr,
    params: ConnectParams,
    hub: Arc<Hub>,
    router: Arc<Router>,
    shutdown: CancellationToken,
}

impl Connection {
    /// Wrap an upgraded socket and the parameters read from its upgrade request.
    pub fn new(
        ws: WebSocketStream<TcpStream>,
        addr: SocketAddr,
        params: ConnectParams,
        hub: Arc<Hub>,
        router: Arc<Router>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            ws,
            addr,
            params,
            hub,
            router,
            shutdown,
        }
    }

    /// Run the connection until the client leaves, is evicted or the server stops.
    pub async fn run(self) -> Result<(), TransportError> {
        let Self {
            ws,
            addr,
            params,
            hub,
            router,
            shutdown,
        } = self;

        let span = Span::current();
        span.record("client_id", params.client_id);
        span.record("name", params.name.as_str());

        let identity = match lifecycle::authenticate(&hub, params.credential.as_deref()).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(%addr, reason = e.reason(), error = %e, "Rejecting unauthenticated connection");
                crate::metrics::record_auth_rejection(e.reason());
                return lifecycle::refuse(ws, &e).await;
            }
        };

        let (session, outbox) = lifecycle::join(&hub, &identity, params.client_id, params.name);
        span.record("conn", field::display(session.conn()));

        let departure = lifecycle::DepartGuard::new(&hub, &session);
        let ctx = Context::new(&hub, &session, &identity);
        let result = event_loop::run(ws, outbox, &ctx, &router, &shutdown).await;
        drop(departure);

        let exit = result?;
        debug!(?exit, "Connection loop finished");
        Ok(())
    }
}
