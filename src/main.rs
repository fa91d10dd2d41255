//! chatterd - realtime WebSocket chat daemon.
//!
//! Usage:
//!
//! ```text
//! chatterd [config.toml]
//! chatterd <config.toml> adduser <username> <password> [full name]
//! ```

use chatterd::config::{Config, HistoryBackend, LogFormat, validation};
use chatterd::db::Database;
use chatterd::handlers::Router;
use chatterd::history::{HistoryStore, NoOpStore, SqliteStore};
use chatterd::network::Gateway;
use chatterd::security::{JwtIdentity, TokenSigner};
use chatterd::state::Hub;
use chatterd::{http, metrics};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How long connection tasks get to send their leave notices on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "config.toml".to_string());
    let command: Vec<String> = args.collect();

    let config = Config::load(&config_path)
        .map_err(|e| anyhow::anyhow!("failed to load config {config_path}: {e}"))?;

    init_tracing(config.logging.format);

    if let Some(subcommand) = command.first() {
        return match subcommand.as_str() {
            "adduser" => add_user(&config, &command[1..]).await,
            other => Err(anyhow::anyhow!(
                "unknown command '{other}'; usage: chatterd <config.toml> adduser <username> <password> [full name]"
            )),
        };
    }

    if let Err(errors) = validation::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "refusing to start with {} configuration error(s)",
            errors.len()
        ));
    }
    if config.auth.jwt_secret.len() < validation::MIN_SECRET_BYTES {
        warn!(
            "INSECURE: running with a short auth.jwt_secret (allowed via {})",
            validation::ALLOW_INSECURE_SECRET_ENV
        );
    }

    info!(server = %config.server.name, "Starting chatterd");

    metrics::init();

    let db = Database::new(&config.database.path).await?;

    let history: Arc<dyn HistoryStore> = match config.history.backend {
        HistoryBackend::Sqlite => {
            info!(path = %config.database.path, "Storing messages in SQLite");
            Arc::new(SqliteStore::new(db.clone()))
        }
        HistoryBackend::None => {
            info!("History backend 'none'. Messages are not stored.");
            Arc::new(NoOpStore::new())
        }
    };

    let signer = TokenSigner::from_config(&config.auth);
    let identity = Arc::new(JwtIdentity::new(signer.clone(), db.clone()));

    let hub = Arc::new(Hub::new(
        config.server.name.clone(),
        config.limits.clone(),
        history,
        identity,
    ));
    let router = Arc::new(Router::new(config.limits.max_frame_bytes));

    if config.http.port == 0 {
        info!("HTTP side-server disabled");
    } else {
        let state = http::HttpState::new(db.clone(), signer);
        let port = config.http.port;
        tokio::spawn(async move {
            http::run_http_server(port, state).await;
        });
    }

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl-C, shutting down"),
                Err(e) => error!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
            }
            shutdown.cancel();
        });
    }

    let gateway = Gateway::bind(
        config.listen.address,
        config.websocket.handshake(),
        Arc::clone(&hub),
        Arc::clone(&router),
    )
    .await?;
    gateway.run(shutdown).await?;

    let deadline = Instant::now() + SHUTDOWN_GRACE;
    while !hub.registry.is_empty() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    if !hub.registry.is_empty() {
        warn!(remaining = hub.registry.len(), "Shutdown grace period elapsed");
    }

    let stats = router.envelope_stats();
    info!(?stats, "chatterd stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// `adduser <username> <password> [full name]`
async fn add_user(config: &Config, args: &[String]) -> anyhow::Result<()> {
    let (username, password) = match args {
        [username, password, ..] => (username, password),
        _ => anyhow::bail!("usage: chatterd <config.toml> adduser <username> <password> [full name]"),
    };
    let full_name = (args.len() > 2).then(|| args[2..].join(" "));

    let db = Database::new(&config.database.path).await?;
    let account = db
        .accounts()
        .create(username, password, full_name.as_deref(), None)
        .await?;

    info!(id = account.id, username = %account.username, "Account created");
    Ok(())
}
