//! FinBoard - Customizable Finance Dashboard
//!
//! Data and refresh core for a dashboard of stock tables, market mover cards
//! and price charts, each polling the Alpha Vantage API on its own timer.

pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod market;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod views;
pub mod widgets;

use api::ApiServer;
use config::AppConfig;
use state::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize and run the dashboard service until Ctrl-C
pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finboard=debug,finboard_lib=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FinBoard...");

    let config = AppConfig::from_env()?;
    let dashboard_file = config.dashboard_file.clone();
    let state = Arc::new(AppState::new(config)?);

    if let Some(path) = dashboard_file {
        match commands::dashboard::import_from_file(&state, &path) {
            Ok(widgets) => tracing::info!("Loaded {} widgets from {:?}", widgets.len(), path),
            Err(e) => {
                tracing::warn!("Failed to load dashboard from {:?}, using defaults: {}", path, e)
            }
        }
    }

    // Start one refresh task per widget
    state.sync_scheduler();
    tracing::info!("Refresh scheduler started for {} widgets", state.scheduler.attached_count());

    let mut server = ApiServer::new(Arc::clone(&state));
    server.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    server.stop();
    state.scheduler.shutdown();
    Ok(())
}
