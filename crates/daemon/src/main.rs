//! Waitline - Main Entry Point
//!
//! Composition root: wires the SQLite adapter into the queue engine and
//! runs the background reconciliation loops until Ctrl+C.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use waitline_core::application::{shutdown_channel, QueueService, RetentionPruner, Sweeper};
use waitline_core::domain::QueueEvent;
use waitline_core::port::time_provider::SystemTimeProvider;
use waitline_core::port::token_provider::RandomTokenProvider;
use waitline_core::port::{NoopPushSender, NotificationSink};
use waitline_infra_sqlite::{create_pool, run_migrations, SqliteQueueRepository};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_DB_PATH: &str = "~/.waitline/waitline.db";

/// Sink for deployments without a realtime channel attached: every event
/// still lands in the structured log.
struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn publish(&self, event: QueueEvent) -> waitline_core::error::Result<()> {
        info!(event = ?event, "Queue event");
        Ok(())
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let log_format = std::env::var("WAITLINE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("waitline=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Waitline v{} starting...", VERSION);

    // 2. Load configuration
    let db_path = std::env::var("WAITLINE_DB_PATH")
        .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_DB_PATH).into_owned());

    let sweep_interval = env_u64("WAITLINE_SWEEP_INTERVAL_SECS").map(Duration::from_secs);
    let retention = env_u64("WAITLINE_RETENTION_DAYS").map(|d| Duration::from_secs(d * 24 * 3600));

    info!(db_path = %db_path, "Initializing database...");

    // 3. Initialize database
    let pool = create_pool(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let token_provider = Arc::new(RandomTokenProvider);
    let repo = Arc::new(SqliteQueueRepository::new(pool.clone()));

    let service = Arc::new(QueueService::new(
        repo.clone(),
        token_provider,
        time_provider.clone(),
        Arc::new(LogNotificationSink),
        Arc::new(NoopPushSender),
    ));

    // 5. Start reconciliation sweeper (auto no-show)
    info!("Starting sweeper...");
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let sweeper = Sweeper::new(
        service.clone(),
        repo.clone(),
        time_provider.clone(),
        sweep_interval,
    );
    let sweeper_shutdown = shutdown_rx.clone();
    let sweeper_handle = tokio::spawn(async move {
        sweeper.run(sweeper_shutdown).await;
    });

    // 6. Start retention pruner
    info!("Starting retention pruner...");
    let pruner = RetentionPruner::new(repo.clone(), time_provider.clone(), retention, None);
    let pruner_handle = tokio::spawn(async move {
        pruner.run(shutdown_rx).await;
    });

    info!("System ready");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    shutdown_tx.shutdown();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweeper_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), pruner_handle).await;

    info!("Shutdown complete.");

    Ok(())
}
