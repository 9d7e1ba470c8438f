use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Number of connected WebSocket clients.
    pub ws_connections: usize,
    /// Live subscriptions on the job event bus. Zero means lifecycle
    /// events are being dropped (the progress notifier is not running).
    pub event_subscribers: usize,
}

/// GET /health -- returns service health and connection stats.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ws_connections = state.ws_manager.connection_count().await;
    let event_subscribers = state.event_bus.subscriber_count();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        ws_connections,
        event_subscribers,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
