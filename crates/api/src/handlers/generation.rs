//! Handlers for submitting generation jobs.
//!
//! Routes:
//! - `POST /generations/{capability}` — enqueue a generation job

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use pulsefit_core::Capability;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for submitting a generation job.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitGenerationRequest {
    /// Owner the job is generated for.
    #[validate(length(min = 1, max = 128, message = "owner_id must be 1-128 characters"))]
    pub owner_id: String,
    /// Capability-specific generation input, passed through to the worker.
    pub payload: serde_json::Value,
    /// Higher values are dispatched first. Defaults to 0.
    #[serde(default)]
    pub priority: i32,
}

/// Response payload for a submitted job.
#[derive(Debug, Serialize)]
pub struct SubmitGenerationResponse {
    pub job_id: String,
    pub capability: Capability,
}

/// POST /api/v1/generations/{capability}
///
/// Parses the capability from the path, validates the request body, and
/// enqueues the job. Returns `202 Accepted` with the job ID; the actual
/// generation runs asynchronously and clients track it via the jobs
/// endpoints or WebSocket events.
pub async fn submit_generation(
    State(state): State<AppState>,
    Path(capability): Path<String>,
    Json(input): Json<SubmitGenerationRequest>,
) -> AppResult<impl IntoResponse> {
    let capability: Capability = capability
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown capability: {capability}")))?;

    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let handle = state
        .dispatcher
        .submit(capability, &input.owner_id, input.payload, input.priority)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: SubmitGenerationResponse {
                job_id: handle.job_id,
                capability,
            },
        }),
    ))
}
