//! WebSocket event naming for generation job lifecycles.
//!
//! Every capability emits four lifecycle events following the pattern
//! `{prefix}-generation-{phase}` (e.g. `workout-generation-progress`).
//! The registration/connection events are the one exception to the
//! pattern.

use crate::capability::Capability;

/// Job picked up by a worker.
pub const PHASE_STARTED: &str = "started";
/// Progress update during generation.
pub const PHASE_PROGRESS: &str = "progress";
/// Generation finished with a result.
pub const PHASE_COMPLETE: &str = "complete";
/// Generation failed terminally.
pub const PHASE_ERROR: &str = "error";

/// Client → server: associate this connection with a user.
pub const EVENT_REGISTER_USER: &str = "register-user";
/// Server → client: registration accepted.
pub const EVENT_REGISTRATION_SUCCESS: &str = "registration-success";
/// Server → client: registration rejected.
pub const EVENT_REGISTRATION_ERROR: &str = "registration-error";

/// Build the event name for a capability lifecycle phase.
pub fn event_name(capability: Capability, phase: &str) -> String {
    format!("{}-generation-{}", capability.prefix(), phase)
}
