pub mod generation;
pub mod health;
pub mod jobs;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                WebSocket (rooms + job events)
///
/// /generations/{capability}          submit a generation job (POST)
///
/// /jobs/{id}                         canonical job status (GET)
/// /users/{owner_id}/jobs/active      open jobs for an owner (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/generations", generation::router())
        .nest("/jobs", jobs::job_router())
        .nest("/users", jobs::user_router())
}
