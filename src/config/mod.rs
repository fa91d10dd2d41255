//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, AuthConfig)
//! - [`listen`]: Network listener configuration (ListenConfig, WebSocketConfig, HttpConfig)
//! - [`history`]: Message storage backend selection (HistoryConfig)
//! - [`limits`]: Per-connection resource limits (LimitsConfig)
//! - [`validation`]: Startup checks run before anything binds

mod history;
mod limits;
mod listen;
mod types;
pub mod validation;

pub use history::{HistoryBackend, HistoryConfig};
pub use limits::LimitsConfig;
pub use listen::{HttpConfig, ListenConfig, WebSocketConfig};
pub use types::{
    AuthConfig, Config, ConfigError, DatabaseConfig, LogFormat, LoggingConfig, ServerConfig,
};
