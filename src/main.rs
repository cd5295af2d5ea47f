mod api;
mod config;
mod engine;
mod error;
mod geo;
mod models;
mod observability;
mod oracle;
mod state;
mod store;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::oracle::HttpRouteOracle;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    if config.oracle_token.is_none() {
        tracing::warn!("ORACLE_TOKEN not set; route effects will fail until configured");
    }

    let oracle = HttpRouteOracle::new(
        config.oracle_base_url.clone(),
        config.oracle_token.clone(),
        Duration::from_millis(config.oracle_timeout_ms),
    )
    .map_err(|err| error::AppError::Internal(format!("failed to build oracle client: {err}")))?;

    let (app_state, change_rx) = state::AppState::new(
        Arc::new(oracle),
        config.max_speed_kmh,
        config.api_token.clone(),
        config.event_queue_size,
        config.alert_buffer_size,
    );
    let shared_state = Arc::new(app_state);

    let app = api::rest::router(shared_state.clone());

    tokio::spawn(engine::dispatcher::run_event_dispatcher(
        shared_state.clone(),
        change_rx,
    ));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
