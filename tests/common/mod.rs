//! Integration test common infrastructure.
//!
//! Provides an in-process server bound to an ephemeral port, WebSocket test
//! clients, and helpers for asserting on JSON envelope flows.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::TestServer;

/// Chat line as it appears on the wire.
#[allow(dead_code)]
pub fn chat(message: &str, sender: &str) -> serde_json::Value {
    serde_json::json!({ "message": message, "sender": sender })
}

/// System notice as it appears on the wire.
#[allow(dead_code)]
pub fn notice(message: &str) -> serde_json::Value {
    chat(message, "system")
}
