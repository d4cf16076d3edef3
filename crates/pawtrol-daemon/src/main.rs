use std::sync::Arc;

use tracing::{info, warn};

use pawtrol_core::channel::DeliveryChannel;
use pawtrol_core::config::PawtrolConfig;
use pawtrol_notify::NotifierEngine;
use pawtrol_store::ReminderStore;
use pawtrol_telegram::TelegramChannel;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pawtrol=info,pawtrol_notify=info,pawtrol_store=info,pawtrol_telegram=info".into()),
        )
        .init();

    // load config: explicit PAWTROL_CONFIG path > ~/.pawtrol/pawtrol.toml
    let config_path = std::env::var("PAWTROL_CONFIG").ok();
    let config = PawtrolConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        PawtrolConfig::default()
    });

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let conn = rusqlite::Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    // schema migration is idempotent and runs inside the store constructor
    let store = ReminderStore::new(conn)?;

    // Absent token is a steady state, not an error: the engine keeps
    // scanning and retries delivery once a token is configured and the
    // process restarts.
    let channel: Arc<dyn DeliveryChannel> = Arc::new(TelegramChannel::new(config.telegram.as_ref()));

    let mut engine = NotifierEngine::new(store, channel, &config.engine);

    if config.engine.sweep_on_start {
        match engine.sweep_overdue(chrono::Utc::now()).await {
            Ok(sent) => info!(sent, "startup overdue sweep finished"),
            Err(e) => warn!("startup overdue sweep failed: {e}"),
        }
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let engine_task = tokio::spawn(engine.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("ctrl-c received — stopping notifier engine");
    let _ = shutdown_tx.send(true);
    let _ = engine_task.await;

    Ok(())
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
