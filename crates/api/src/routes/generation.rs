//! Route definitions for generation job submission.
//!
//! ```text
//! POST /{capability}    submit_generation
//! ```

use axum::routing::post;
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

/// Routes mounted under the `/generations` nest.
pub fn router() -> Router<AppState> {
    Router::new().route("/{capability}", post(generation::submit_generation))
}
