//! Gateway - WebSocket listener that accepts incoming connections.
//!
//! The Gateway binds one TCP socket, performs the HTTP upgrade for each
//! client and spawns a Connection task once the upgrade succeeds. Path,
//! display name and credential are read from the upgrade request here; the
//! credential itself is verified by the Connection.

use crate::handlers::Router;
use crate::network::Connection;
use crate::state::Hub;
use crate::telemetry::spans;
use chatter_proto::websocket::{ConnectParams, WebSocketConfig, parse_connect_request};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, instrument, warn};

/// The Gateway accepts incoming WebSocket connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    websocket: Arc<WebSocketConfig>,
    hub: Arc<Hub>,
    router: Arc<Router>,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(
        addr: SocketAddr,
        websocket: WebSocketConfig,
        hub: Arc<Hub>,
        router: Arc<Router>,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "WebSocket listener bound");

        Ok(Self {
            listener,
            websocket: Arc::new(websocket),
            hub,
            router,
        })
    }

    /// Address actually bound; differs from the requested one for port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the gateway, accepting connections until `shutdown` fires.
    ///
    /// Connection tasks watch the same token, so each one unregisters and
    /// announces its departure on its own.
    #[instrument(skip_all, name = "gateway")]
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Gateway shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => accepted,
            };

            let (stream, addr) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "Failed to accept WebSocket connection");
                    continue;
                }
            };

            info!(%addr, "WebSocket connection attempt");

            let span = spans::connection(addr, &self.hub.server_name);
            let websocket = Arc::clone(&self.websocket);
            let hub = Arc::clone(&self.hub);
            let router = Arc::clone(&self.router);
            let shutdown = shutdown.child_token();

            tokio::spawn(
                serve(stream, addr, websocket, hub, router, shutdown)
                    .instrument(span),
            );
        }
    }
}

/// Upgrade one TCP stream and run its connection to completion.
async fn serve(
    stream: TcpStream,
    addr: SocketAddr,
    websocket: Arc<WebSocketConfig>,
    hub: Arc<Hub>,
    router: Arc<Router>,
    shutdown: CancellationToken,
) {
    let mut params: Option<ConnectParams> = None;

    let callback = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        match parse_connect_request(req, &websocket) {
            Ok(connect) => {
                params = Some(connect);
                Ok(response)
            }
            Err(rejection) => {
                warn!(%addr, path = req.uri().path(), %rejection, "WebSocket upgrade rejected");
                Err(rejection.into_error_response())
            }
        }
    };

    let ws = match accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%addr, error = %e, "WebSocket handshake failed");
            return;
        }
    };

    let Some(params) = params else {
        // The callback only lets an upgrade through after filling `params`.
        error!(%addr, "Upgrade completed without connect parameters");
        return;
    };

    info!(%addr, client_id = params.client_id, "WebSocket handshake successful");

    let connection = Connection::new(ws, addr, params, hub, router, shutdown);
    if let Err(e) = connection.run().await {
        warn!(%addr, error = %e, "WebSocket connection error");
    }
    info!(%addr, "WebSocket connection closed");
}
