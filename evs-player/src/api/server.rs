//! HTTP server setup and routing
//!
//! Sets up the Axum HTTP server with routes for control endpoints and SSE.

use crate::error::{Error, Result};
use crate::orchestrator::SwitchOrchestrator;
use crate::request::RequestPublisher;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub orchestrator: Arc<SwitchOrchestrator>,
    /// Feeds accepted requests to the request loop
    pub requests: RequestPublisher,
    pub port: u16,
}

/// Build the router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(super::handlers::health))
        // Switch control
        .route("/switch", post(super::handlers::submit_switch))
        .route("/state", get(super::handlers::get_state))
        // Estimator diagnostics
        .route("/stats", get(super::handlers::get_stats))
        .route("/stats/:backend/report", get(super::handlers::get_stats_report))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Controllers run in a browser on another origin
        .layer(CorsLayer::permissive())
}

/// Serve the API until `shutdown` resolves
pub async fn run(ctx: AppContext, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], ctx.port));
    let app = create_router(ctx);

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}
