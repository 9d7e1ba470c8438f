//! Progress-to-phase-message derivation.
//!
//! The threshold table is intentionally coarse and shared across all
//! capabilities: it is a presentation heuristic, not a progress model.

/// Shown below 10% progress.
pub const PHASE_STARTING: &str = "Starting generation...";
/// Shown from 10% progress.
pub const PHASE_ANALYZING: &str = "Analyzing your profile...";
/// Shown from 50% progress.
pub const PHASE_GENERATING: &str = "Generating exercises...";
/// Shown from 90% progress.
pub const PHASE_FINALIZING: &str = "Finalizing plan...";

/// Derive the human-readable phase message for a progress value.
///
/// Monotone thresholds; the highest matching threshold wins.
pub fn phase_message(progress: u8) -> &'static str {
    match progress {
        90..=u8::MAX => PHASE_FINALIZING,
        50..=89 => PHASE_GENERATING,
        10..=49 => PHASE_ANALYZING,
        _ => PHASE_STARTING,
    }
}
