//! Core handler infrastructure.
//!
//! This module contains the handler trait, the per-envelope context, and the
//! router that decodes frames and dispatches them by `type`.

pub mod context;
pub mod registry;
#[cfg(test)]
pub(crate) mod testing;

pub use context::{Context, Handler};
pub use registry::Router;
