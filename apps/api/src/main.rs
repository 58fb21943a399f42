mod auth;
mod config;
mod errors;
mod ledger;
mod models;
mod processing;
mod queue;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::claims::TokenVerifier;
use crate::config::Config;
use crate::ledger::postgres::PgJobLedger;
use crate::ledger::JobLedger;
use crate::processing::retention::spawn_retention_sweeper;
use crate::queue::redis_list::RedisWorkQueue;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::s3::S3ResumeStorage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting carriX API v{}", env!("CARGO_PKG_VERSION"));

    // Job ledger (PostgreSQL)
    let ledger: Arc<dyn JobLedger> = Arc::new(
        PgJobLedger::connect(&config.database_url, config.database_max_connections).await?,
    );

    // Work queue (Redis)
    let queue = Arc::new(RedisWorkQueue::connect(&config.redis_url).await?);
    info!("Redis work queue initialized (queue: {})", config.queue_name);

    // Resume object storage (S3 / MinIO)
    let storage = Arc::new(S3ResumeStorage::from_config(&config).await);
    info!("S3 client initialized");

    let state = AppState {
        ledger: ledger.clone(),
        queue,
        storage,
        tokens: TokenVerifier::new(&config.jwt_secret),
        config: config.clone(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = spawn_retention_sweeper(
        ledger,
        config.queue_name.clone(),
        config.dispatch,
        Duration::from_secs(config.retention_sweep_secs),
        shutdown_rx,
    );

    let app = build_router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the carriX web app

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        warn!("Retention sweeper task failed: {e}");
    }
    state.shutdown().await;

    info!("carriX API stopped");
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install CTRL+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received; draining connections");
}
