//! chatterd - realtime WebSocket chat daemon.
//!
//! Authenticated clients connect over a WebSocket, exchange JSON envelopes
//! and are routed to each other through an in-memory session registry.
//! Public and private messages are persisted to SQLite before delivery.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod history;
pub mod http;
pub mod metrics;
pub mod network;
pub mod security;
pub mod state;
pub mod telemetry;
