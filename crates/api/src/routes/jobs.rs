//! Route definitions for job status queries.
//!
//! ```text
//! /jobs/{id}                       get_job_status
//! /users/{owner_id}/jobs/active    list_active_jobs
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted under the `/jobs` nest.
pub fn job_router() -> Router<AppState> {
    Router::new().route("/{id}", get(jobs::get_job_status))
}

/// Routes mounted under the `/users` nest.
pub fn user_router() -> Router<AppState> {
    Router::new().route("/{owner_id}/jobs/active", get(jobs::list_active_jobs))
}
