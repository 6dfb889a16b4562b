//! HTTP server for the dashboard front-end
//!
//! Serves the widget, view, market data and export/import endpoints as JSON.

use crate::api::handlers;
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the router with all routes
pub fn router(state: Arc<AppState>) -> Router {
    // Allow all origins for a locally served front-end
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ================================================================
        // Health check
        // ================================================================
        .route("/health", get(handlers::health_check))
        .route("/", get(handlers::health_check))

        // ================================================================
        // Widgets
        // ================================================================
        .route("/api/widget-types", get(handlers::list_widget_types))
        .route("/api/widgets", get(handlers::list_widgets).post(handlers::add_widget))
        .route("/api/widgets/order", put(handlers::reorder_widgets))
        .route("/api/widgets/move", post(handlers::move_widget))
        .route(
            "/api/widgets/:id",
            patch(handlers::update_widget).delete(handlers::delete_widget),
        )
        .route("/api/widgets/:id/refresh", post(handlers::refresh_widget))
        .route("/api/widgets/:id/snapshot", post(handlers::snapshot_widget))
        .route("/api/widgets/:id/view", get(handlers::get_widget_view))
        .route("/api/dashboard", get(handlers::get_dashboard))

        // ================================================================
        // Market data cache
        // ================================================================
        .route("/api/market/quotes", get(handlers::get_quotes))
        .route("/api/market/gainers", get(handlers::get_gainers))
        .route("/api/market/chart/:symbol", get(handlers::get_chart))
        .route("/api/cache/clear", post(handlers::clear_cache))
        .route("/api/cache/clear-errors", post(handlers::clear_errors))

        // ================================================================
        // Export / Import
        // ================================================================
        .route("/api/config/export", get(handlers::export_config))
        .route("/api/config/import", post(handlers::import_config))

        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// API server manager
pub struct ApiServer {
    state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            shutdown_tx: None,
        }
    }

    /// Bind the configured address and serve in the background.
    /// Returns the bound address (useful when the port is 0).
    pub async fn start(&mut self) -> Result<SocketAddr> {
        let host = self.state.config.server.host.clone();
        let port = self.state.config.server.port;

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid address {}:{}: {}", host, port, e)))?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let app = router(Arc::clone(&self.state));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        info!("Starting FinBoard API server on {}", local_addr);

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            });

            if let Err(e) = server.await {
                error!("API server error: {}", e);
            }
        });

        info!("=== Endpoints ===");
        info!("  GET  http://{}/health", local_addr);
        info!("  GET  http://{}/api/dashboard", local_addr);
        info!("  GET  http://{}/api/widgets", local_addr);
        info!("  GET  http://{}/api/config/export", local_addr);

        Ok(local_addr)
    }

    /// Stop the server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("API server stop signal sent");
        }
    }

    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }
}
