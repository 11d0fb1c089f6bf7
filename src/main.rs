// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! refresh-gate API Server
//!
//! Serves `POST /refresh`, rotating refresh tokens and issuing new
//! access tokens.

use refresh_gate::{
    config::Config,
    db::MemoryTokenStore,
    services::{AnyUser, SystemClock},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        issuer = %config.issuer,
        access_ttl_secs = config.access_ttl.as_secs(),
        refresh_ttl_secs = config.refresh_ttl.as_secs(),
        "Starting refresh-gate"
    );

    // Collaborators are assembled once here and passed down explicitly
    let store = Arc::new(MemoryTokenStore::new());
    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        Arc::new(AnyUser),
        Arc::new(SystemClock),
    ));

    spawn_expiry_sweep(state.clone());

    // Build router
    let app = refresh_gate::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Periodically purge expired refresh records.
fn spawn_expiry_sweep(state: Arc<AppState>) {
    let period = state.config.sweep_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = state.refresh.sweep_expired().await {
                tracing::warn!(error = %e, "Expiry sweep failed");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("refresh_gate=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
