//! Message storage configuration.

use serde::Deserialize;

/// Which store receives public and private messages.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    /// Rows in the `public_messages` / `private_messages` tables.
    #[default]
    Sqlite,
    /// Hand out ids without storing anything.
    None,
}

/// History configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryConfig {
    /// Backend type: "sqlite" or "none".
    #[serde(default)]
    pub backend: HistoryBackend,
}
