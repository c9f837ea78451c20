// Main entry point for the engagement server

use std::sync::Arc;

use anyhow::{Context, Result};
use engagement_core::kernel::{
    scheduled_tasks::start_scheduler, PostgresEngagementStore, RegexEmailExtractor, ServerDeps,
};
use engagement_core::{server::build_app, Config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use unipile_client::UnipileClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,engagement_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting comment-trigger engagement server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        concurrency = config.sweep.concurrency,
        gateway_timeout_secs = config.sweep.gateway_timeout.as_secs(),
        "Configuration loaded"
    );

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Wire dependencies
    let unipile = Arc::new(UnipileClient::new(
        config.unipile_dsn.clone(),
        config.unipile_api_key.clone(),
    ));
    let deps = Arc::new(ServerDeps::with_unipile(
        Arc::new(PostgresEngagementStore::new(pool.clone())),
        unipile,
        Arc::new(RegexEmailExtractor::new()),
        config.sweep.clone(),
    ));

    // Optional in-process sweep schedule
    let _scheduler = match &config.sweep_cron {
        Some(cron) => Some(start_scheduler(deps.clone(), cron).await?),
        None => {
            tracing::info!("SWEEP_CRON not set, sweeps run only via /cron/poll-comments");
            None
        }
    };

    if config.cron_secret.is_none() {
        tracing::warn!("CRON_SECRET not set, /cron/poll-comments is unauthenticated");
    }

    // Build application
    let app = build_app(pool, deps, config.cron_secret.clone());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Sweep endpoint: http://localhost:{}/cron/poll-comments", config.port);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
