//! Helpers shared across handlers.

pub mod fanout;
