//! State management module.
//!
//! Contains the Hub (shared server state), the session registry, and
//! connection handles.

mod hub;
mod registry;
mod session;
mod uid;

pub use hub::Hub;
pub use registry::ConnectionRegistry;
pub use session::{Delivery, Frame, Session};
pub use uid::{ConnId, ConnIdGenerator};
