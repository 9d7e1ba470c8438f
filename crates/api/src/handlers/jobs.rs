//! Handlers for job status queries.
//!
//! Routes:
//! - `GET /jobs/{id}`                — canonical status of one job
//! - `GET /users/{owner_id}/jobs/active` — open jobs for an owner

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use pulsefit_core::CoreError;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/jobs/{id}
///
/// Looks the job up across every capability queue. Completed jobs remain
/// visible for a retention window after finishing; afterwards this
/// returns 404, which clients should treat as "done and evicted".
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let status = state
        .aggregator
        .get_status(&job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))?;

    Ok(Json(DataResponse { data: status }))
}

/// GET /api/v1/users/{owner_id}/jobs/active
///
/// Returns every waiting, active, or delayed job belonging to the owner,
/// across all capability queues. Terminal and paused jobs are excluded.
pub async fn list_active_jobs(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let jobs = state.aggregator.list_active_for_user(&owner_id).await?;
    Ok(Json(DataResponse { data: jobs }))
}
