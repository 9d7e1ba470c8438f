/// Errors surfaced by work queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The queue cannot accept submissions or serve lookups right now.
    /// Surfaced synchronously to the caller, never a silent drop.
    #[error("Queue unavailable: {0}")]
    Unavailable(String),

    /// Backend-specific failure that is not an availability problem.
    #[error("Queue error: {0}")]
    Internal(String),
}
