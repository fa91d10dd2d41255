//! Network listener configuration.

use serde::Deserialize;
use std::net::SocketAddr;

/// WebSocket listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind to (e.g., "0.0.0.0:8000").
    pub address: SocketAddr,
}

/// WebSocket upgrade policy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebSocketConfig {
    /// Allowed origins for CORS (e.g., `["https://example.com"]`).
    /// Empty list allows all origins.
    #[serde(default)]
    pub allow_origins: Vec<String>,
}

impl WebSocketConfig {
    /// Handshake settings for the upgrade callback.
    pub fn handshake(&self) -> chatter_proto::websocket::WebSocketConfig {
        chatter_proto::websocket::WebSocketConfig {
            allowed_origins: self.allow_origins.clone(),
        }
    }
}

/// HTTP side-server configuration (token issuance, health, metrics).
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Port on the listen address's IP (default: 9090). 0 disables the server.
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
        }
    }
}

fn default_http_port() -> u16 {
    9090
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_config_deserialize() {
        let cfg: ListenConfig = toml::from_str(r#"address = "0.0.0.0:8000""#).unwrap();
        assert_eq!(cfg.address.port(), 8000);
    }

    #[test]
    fn websocket_config_defaults_to_any_origin() {
        let cfg: WebSocketConfig = toml::from_str("").unwrap();
        assert!(cfg.allow_origins.is_empty());
        assert!(cfg.handshake().allowed_origins.is_empty());
    }

    #[test]
    fn websocket_config_with_origins() {
        let toml_str = r#"
            allow_origins = ["https://example.com", "https://another.com"]
        "#;
        let cfg: WebSocketConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.allow_origins.len(), 2);
        assert_eq!(cfg.handshake().allowed_origins[0], "https://example.com");
    }

    #[test]
    fn http_port_default_and_disable() {
        assert_eq!(HttpConfig::default().port, 9090);
        let cfg: HttpConfig = toml::from_str("port = 0").unwrap();
        assert_eq!(cfg.port, 0);
    }
}
