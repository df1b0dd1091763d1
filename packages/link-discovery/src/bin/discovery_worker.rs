//! Long-running discovery worker: drains the request queue and runs cleanup.

use std::sync::Arc;

use anyhow::{Context, Result};
use link_discovery::{Config, DiscoveryOrchestrator, DiscoveryWorker, PostgresDiscoveryStore};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,link_discovery=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting link discovery worker");

    let config = Config::from_env()?;

    // Database setup
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let store = Arc::new(PostgresDiscoveryStore::new(pool));
    let orchestrator = Arc::new(DiscoveryOrchestrator::with_default_algorithms(
        store,
        config.discovery,
    ));

    let shutdown = CancellationToken::new();
    let worker = DiscoveryWorker::new(orchestrator).spawn(shutdown.clone());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");
    shutdown.cancel();

    worker.await.context("Discovery worker task panicked")??;
    Ok(())
}
