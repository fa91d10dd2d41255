//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::history::HistoryConfig;
use super::limits::LimitsConfig;
use super::listen::{HttpConfig, ListenConfig, WebSocketConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server information.
    pub server: ServerConfig,
    /// WebSocket listen configuration.
    pub listen: ListenConfig,
    /// WebSocket upgrade policy.
    #[serde(default)]
    pub websocket: WebSocketConfig,
    /// HTTP side-server.
    #[serde(default)]
    pub http: HttpConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Message storage.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Token signing and verification.
    pub auth: AuthConfig,
    /// Per-connection limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name, used in logs.
    pub name: String,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "chatterd.db".to_string()
}

/// Bearer token configuration.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for HS256 tokens.
    pub jwt_secret: String,
    /// Lifetime of issued tokens in minutes (default: 30).
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: u64,
    /// `iss` claim to issue and require. Unset means no issuer check.
    #[serde(default)]
    pub issuer: Option<String>,
}

// Keep the secret out of debug output.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("issuer", &self.issuer)
            .finish()
    }
}

fn default_token_ttl_minutes() -> u64 {
    30
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging configuration. Filtering is controlled by `RUST_LOG`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}
