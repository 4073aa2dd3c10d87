//! Bastion API Server
//!
//! Main entry point for the Bastion backend service.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use bastion_api::{AppState, create_router};
use bastion_db::{SessionRepository, connect};
use bastion_shared::{
    AppConfig, JwtService,
    config::{LogConfig, LogFormat},
};

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bastion=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match log.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Purges expired sessions once per interval.
fn spawn_session_cleanup(sessions: SessionRepository) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match sessions.cleanup_expired().await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "Purged expired sessions"),
                Err(err) => tracing::warn!(error = %err, "Session cleanup failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log);

    let db = Arc::new(
        connect(&config.database)
            .await
            .context("failed to connect to database")?,
    );
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    spawn_session_cleanup(SessionRepository::new(Arc::clone(&db)));

    let jwt_service = JwtService::new((&config.jwt).into());

    let state = AppState {
        db,
        jwt_service: Arc::new(jwt_service),
    };

    let app = create_router(state, &config.server.cors_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
