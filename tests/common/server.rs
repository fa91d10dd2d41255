//! Test server management.
//!
//! Runs a chatterd gateway inside the test process on `127.0.0.1:0`, backed
//! by a private in-memory database and real JWT verification.

use async_trait::async_trait;
use chatter_proto::websocket::WebSocketConfig;
use chatterd::config::LimitsConfig;
use chatterd::db::Database;
use chatterd::handlers::Router;
use chatterd::history::{HistoryStore, SqliteStore, StorageError};
use chatterd::network::Gateway;
use chatterd::security::{JwtIdentity, TokenSigner};
use chatterd::state::Hub;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::client::TestClient;

/// Password given to every account created by [`TestServer::token_for`].
pub const PASSWORD: &str = "hunter2";

const SECRET: &[u8] = b"integration-test-secret-0123456789";

/// SQLite store that can be switched into a failing mode.
pub struct FlakyStore {
    inner: SqliteStore,
    failing: AtomicBool,
}

impl FlakyStore {
    fn check(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(StorageError::Unavailable("switched off by test".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for FlakyStore {
    async fn append_public(&self, sender_id: i64, text: &str) -> Result<i64, StorageError> {
        self.check()?;
        self.inner.append_public(sender_id, text).await
    }

    async fn append_private(
        &self,
        sender_id: i64,
        recipient_id: i64,
        text: &str,
    ) -> Result<i64, StorageError> {
        self.check()?;
        self.inner.append_private(sender_id, recipient_id, text).await
    }
}

/// A test server instance.
pub struct TestServer {
    addr: SocketAddr,
    pub hub: Arc<Hub>,
    pub db: Database,
    pub signer: TokenSigner,
    store: Arc<FlakyStore>,
    shutdown: CancellationToken,
}

#[allow(dead_code)]
impl TestServer {
    /// Spawn a server with default limits and no origin restrictions.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(WebSocketConfig::default(), LimitsConfig::default()).await
    }

    /// Spawn a server with custom upgrade policy and limits.
    pub async fn spawn_with(
        websocket: WebSocketConfig,
        limits: LimitsConfig,
    ) -> anyhow::Result<Self> {
        let db = Database::new(":memory:").await?;
        let signer = TokenSigner::new(SECRET, Duration::from_secs(1800), None);

        let store = Arc::new(FlakyStore {
            inner: SqliteStore::new(db.clone()),
            failing: AtomicBool::new(false),
        });
        let identity = Arc::new(JwtIdentity::new(signer.clone(), db.clone()));

        let hub = Arc::new(Hub::new("chat.test", limits.clone(), store.clone(), identity));
        let router = Arc::new(Router::new(limits.max_frame_bytes));

        let gateway = Gateway::bind(
            "127.0.0.1:0".parse()?,
            websocket,
            Arc::clone(&hub),
            router,
        )
        .await?;
        let addr = gateway.local_addr()?;

        let shutdown = CancellationToken::new();
        tokio::spawn(gateway.run(shutdown.clone()));

        Ok(Self {
            addr,
            hub,
            db,
            signer,
            store,
            shutdown,
        })
    }

    /// Chat URL for a client id and optional display name.
    pub fn url(&self, client_id: impl std::fmt::Display, name: Option<&str>) -> String {
        match name {
            Some(name) => format!("ws://{}/ws/{client_id}?name={name}", self.addr),
            None => format!("ws://{}/ws/{client_id}", self.addr),
        }
    }

    /// Create an account (if needed) and issue a token for it.
    pub async fn token_for(&self, username: &str) -> anyhow::Result<String> {
        if self.db.accounts().find_by_username(username).await?.is_none() {
            self.db.accounts().create(username, PASSWORD, None, None).await?;
        }
        Ok(self.signer.issue(username)?)
    }

    /// Account id for `username`.
    pub async fn account_id(&self, username: &str) -> anyhow::Result<i64> {
        self.db
            .accounts()
            .find_by_username(username)
            .await?
            .map(|account| account.id)
            .ok_or_else(|| anyhow::anyhow!("no account {username}"))
    }

    /// Connect an authenticated client and consume its own join notice.
    ///
    /// The account username is the lowercased display name.
    pub async fn connect(&self, client_id: i64, name: &str) -> anyhow::Result<TestClient> {
        let username = name.to_lowercase();
        let token = self.token_for(&username).await?;
        let mut client = TestClient::connect(&self.url(client_id, Some(name)), Some(&token)).await?;

        let joined = client.recv_json().await?;
        let expected = super::notice(&format!("{name} joined the chat"));
        anyhow::ensure!(joined == expected, "unexpected first frame: {joined}");
        Ok(client)
    }

    /// Make message appends fail (or succeed again).
    pub fn fail_storage(&self, failing: bool) {
        self.store.failing.store(failing, Ordering::Relaxed);
    }

    /// Wait until the registry holds exactly `count` sessions.
    pub async fn wait_for_sessions(&self, count: usize) -> anyhow::Result<()> {
        for _ in 0..100 {
            if self.hub.registry.len() == count {
                return Ok(());
            }
            sleep(Duration::from_millis(20)).await;
        }
        anyhow::bail!(
            "expected {count} sessions, registry has {}",
            self.hub.registry.len()
        )
    }

    /// Stored public messages as `(sender_id, content)`, oldest first.
    pub async fn public_messages(&self) -> anyhow::Result<Vec<(i64, String)>> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT sender_id, content FROM public_messages ORDER BY id",
        )
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }

    /// Stored private messages as `(sender_id, recipient_id, content)`, oldest first.
    pub async fn private_messages(&self) -> anyhow::Result<Vec<(i64, i64, String)>> {
        let rows = sqlx::query_as::<_, (i64, i64, String)>(
            "SELECT sender_id, recipient_id, content FROM private_messages ORDER BY id",
        )
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }

    /// Stop accepting and close every connection.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
