//! Bearer-token identity.
//!
//! Tokens are HS256 JWTs whose `sub` is an account username. A WebSocket
//! connect is authorized only if the token verifies, has not expired, and
//! names an enabled account.

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::AuthConfig;
use crate::db::Database;

/// Who is on the other end of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Account id; used as `sender_id` when storing messages.
    pub id: i64,
    pub username: String,
}

/// Why a credential was refused.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credential presented")]
    MissingCredential,
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("unknown account: {0}")]
    UnknownAccount(String),
    #[error("account disabled: {0}")]
    AccountDisabled(String),
    #[error("identity lookup failed: {0}")]
    Lookup(String),
}

impl AuthError {
    /// Static reason label, suitable for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::Expired => "expired",
            Self::InvalidToken(_) => "invalid_token",
            Self::UnknownAccount(_) => "unknown_account",
            Self::AccountDisabled(_) => "account_disabled",
            Self::Lookup(_) => "lookup_failed",
        }
    }
}

/// Resolves a raw credential to an [`Identity`].
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<Identity, AuthError>;
}

/// JWT claims carried by issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account username.
    pub sub: String,
    /// Expiry, Unix seconds.
    pub exp: u64,
    /// Issued at, Unix seconds.
    pub iat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Signs and checks HS256 tokens with one shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    issuer: Option<String>,
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl: Duration, issuer: Option<String>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            issuer,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            Duration::from_secs(config.token_ttl_minutes.saturating_mul(60)),
            config.issuer.clone(),
        )
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `username`, valid for the configured lifetime.
    pub fn issue(&self, username: &str) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        self.issue_at(username, now, now.saturating_add(self.ttl.as_secs()))
    }

    fn issue_at(&self, username: &str, iat: u64, exp: u64) -> Result<String, AuthError> {
        let claims = Claims {
            sub: username.to_string(),
            exp,
            iat,
            iss: self.issuer.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Check signature, expiry and issuer; return the claims.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
        }

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}

/// Verifies JWTs and resolves their subject against the account table.
#[derive(Clone)]
pub struct JwtIdentity {
    signer: TokenSigner,
    db: Database,
}

impl JwtIdentity {
    pub fn new(signer: TokenSigner, db: Database) -> Self {
        Self { signer, db }
    }
}

#[async_trait]
impl IdentityGateway for JwtIdentity {
    async fn verify(&self, credential: &str) -> Result<Identity, AuthError> {
        let claims = self.signer.decode(credential)?;

        let account = self
            .db
            .accounts()
            .find_by_username(&claims.sub)
            .await
            .map_err(|e| AuthError::Lookup(e.to_string()))?
            .ok_or_else(|| AuthError::UnknownAccount(claims.sub.clone()))?;

        if account.disabled {
            return Err(AuthError::AccountDisabled(account.username));
        }

        debug!(account = %account.username, id = account.id, "Token verified");
        Ok(Identity {
            id: account.id,
            username: account.username,
        })
    }
}
