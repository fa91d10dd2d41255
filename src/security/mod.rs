//! Security module for chatterd.
//!
//! - **Password**: Argon2 hashing for stored account credentials
//! - **Identity**: bearer-token verification for WebSocket connects and
//!   token issuance for the HTTP `/token` endpoint

pub mod identity;
pub mod password;

pub use identity::{AuthError, Identity, IdentityGateway, JwtIdentity, TokenSigner};
