//! HTTP side-server: token issuance, health check and Prometheus metrics.
//!
//! Runs on a separate tokio task next to the WebSocket gateway. `/token`
//! exchanges a username and password for a bearer token, returned both in
//! the body and as the `access_token` cookie the chat upgrade reads.

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::http::header::{SET_COOKIE, WWW_AUTHENTICATE};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chatter_proto::websocket::TOKEN_COOKIE;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::db::{Database, DbError};
use crate::security::TokenSigner;

/// Shared state for HTTP handlers.
pub struct HttpState {
    db: Database,
    signer: TokenSigner,
}

impl HttpState {
    pub fn new(db: Database, signer: TokenSigner) -> Self {
        Self { db, signer }
    }
}

/// Form body of `POST /token`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

/// Body returned by a successful `POST /token`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: &'static str,
}

/// Handler for POST /token.
async fn token_handler(
    State(state): State<Arc<HttpState>>,
    Form(req): Form<TokenRequest>,
) -> Response {
    let account = match state.db.accounts().authenticate(&req.username, &req.password).await {
        Ok(account) => account,
        Err(
            DbError::AccountNotFound(_) | DbError::InvalidPassword | DbError::AccountDisabled(_),
        ) => {
            tracing::info!(username = %req.username, "Token request refused");
            crate::metrics::record_auth_rejection("bad_credentials");
            return (
                StatusCode::UNAUTHORIZED,
                [(WWW_AUTHENTICATE, "Bearer")],
                Json(ErrorBody {
                    detail: "Incorrect username or password",
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Account lookup failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let token = match state.signer.issue(&account.username) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "Failed to sign token");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::info!(username = %account.username, "Issued access token");

    let cookie = token_cookie(&token, state.signer.ttl().as_secs());
    (
        [(SET_COOKIE, cookie)],
        Json(TokenResponse {
            access_token: token,
            token_type: "bearer".to_string(),
        }),
    )
        .into_response()
}

/// `Set-Cookie` value carrying the token for the WebSocket upgrade.
fn token_cookie(token: &str, max_age_secs: u64) -> String {
    format!("{TOKEN_COOKIE}={token}; HttpOnly; Path=/; Max-Age={max_age_secs}; SameSite=Lax")
}

/// Handler for GET /health.
async fn health_handler() -> &'static str {
    "OK"
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

/// Build the side-server routes.
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/token", post(token_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(Arc::new(state))
}

/// Serve the side-server on an already bound listener.
pub async fn serve(listener: TcpListener, state: HttpState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

/// Run the HTTP side-server.
///
/// Binds to `0.0.0.0:port`. This is a long-running task that should be
/// spawned in the background.
pub async fn run_http_server(port: u16, state: HttpState) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind HTTP server");
            return;
        }
    };
    tracing::info!(%addr, "HTTP side-server listening");

    if let Err(e) = serve(listener, state).await {
        tracing::error!(error = %e, "HTTP server error");
    }
}
