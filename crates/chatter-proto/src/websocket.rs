//! WebSocket upgrade support.
//!
//! Clients connect with `GET /ws/{client_id}?name=<display name>` and present
//! a bearer credential either in the `access_token` cookie or in an
//! `Authorization: Bearer` header. This module extracts those pieces from the
//! upgrade request and validates the origin; verifying the credential is left
//! to the server.

use std::fmt;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::http::header::{AUTHORIZATION, COOKIE, ORIGIN};

/// Path prefix for chat upgrades.
pub const CHAT_PATH_PREFIX: &str = "/ws/";

/// Cookie carrying the bearer credential.
pub const TOKEN_COOKIE: &str = "access_token";

/// Query parameter carrying the display name.
pub const NAME_PARAM: &str = "name";

/// Display name used when the client does not pick one.
pub fn default_name(client_id: i64) -> String {
    format!("Client #{client_id}")
}

/// Configuration for the WebSocket upgrade.
#[derive(Debug, Clone, Default)]
pub struct WebSocketConfig {
    /// List of allowed origin URLs (empty allows all).
    pub allowed_origins: Vec<String>,
}

/// Parameters a client supplied while connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Client id taken from the request path.
    pub client_id: i64,
    /// Display name, URL-decoded, or [`default_name`].
    pub name: String,
    /// Raw bearer credential, if any was presented.
    pub credential: Option<String>,
    /// The `Origin` header, if present.
    pub origin: Option<String>,
}

/// Why an upgrade request was refused before the WebSocket was established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRejection {
    /// HTTP status code to return.
    pub status: StatusCode,
    /// Human-readable rejection reason.
    pub reason: String,
}

impl HandshakeRejection {
    fn new(status: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    /// Build the HTTP response tungstenite sends back for a refused upgrade.
    pub fn into_error_response(self) -> ErrorResponse {
        let mut response = ErrorResponse::new(Some(self.reason));
        *response.status_mut() = self.status;
        response
    }
}

impl fmt::Display for HandshakeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reject {} - {}", self.status.as_u16(), self.reason)
    }
}

/// Extract [`ConnectParams`] from an upgrade request and check its origin.
pub fn parse_connect_request(
    req: &Request,
    config: &WebSocketConfig,
) -> Result<ConnectParams, HandshakeRejection> {
    let origin = req
        .headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if let Some(value) = origin.as_deref() {
        let allowed = config.allowed_origins.is_empty()
            || config
                .allowed_origins
                .iter()
                .any(|allowed| allowed == value || allowed == "*");
        if !allowed {
            return Err(HandshakeRejection::new(
                StatusCode::FORBIDDEN,
                format!("Origin '{value}' not allowed"),
            ));
        }
    }

    let client_id = req
        .uri()
        .path()
        .strip_prefix(CHAT_PATH_PREFIX)
        .and_then(|rest| rest.trim_end_matches('/').parse::<i64>().ok())
        .ok_or_else(|| HandshakeRejection::new(StatusCode::NOT_FOUND, "Not Found"))?;

    let name = req
        .uri()
        .query()
        .and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == NAME_PARAM)
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_else(|| default_name(client_id));

    Ok(ConnectParams {
        client_id,
        name,
        credential: extract_credential(req),
        origin,
    })
}

/// Find the bearer credential: cookie first, then the `Authorization` header.
pub fn extract_credential(req: &Request) -> Option<String> {
    let from_cookie = req
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == TOKEN_COOKIE)
        .map(|(_, value)| value.trim_matches('"').to_string());

    from_cookie
        .filter(|token| !token.is_empty())
        .or_else(|| {
            req.headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty())
        })
}
