//! REST API for the household state and tick telemetry.
//!
//! Provides two GET endpoints:
//! - `/state`: clock, budget, devices, timers, and metered energy
//! - `/telemetry`: resolved ticks with optional minute-range filtering

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::sim::engine::Engine;

pub use types::{DeviceRecord, ErrorResponse, StateResponse, TelemetryQuery, TelemetryRecord};

/// Immutable application state shared across all request handlers.
///
/// Built once after the scenario run and wrapped in `Arc`. Nothing mutates
/// the engine afterwards, so handlers need no locks.
pub struct AppState {
    /// Engine in its post-run state.
    pub engine: Engine,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/telemetry", get(handlers::get_telemetry))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on http://{addr}");
    axum::serve(listener, app).await
}
