//! Canonical job lifecycle status.
//!
//! Every queue backend reports job state in its own native vocabulary
//! (lowercase strings). [`JobStatus::from_native`] normalizes those into
//! the seven canonical values used uniformly across the pipeline.

use serde::{Deserialize, Serialize};

/// Canonical job lifecycle state.
///
/// Lifecycle: submission → `Waiting` → `Active` → {`Completed` |
/// `Failed`}, with `Delayed`/`Paused`/`Stuck` as transient or
/// operational side-states reachable from `Waiting`/`Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Waiting,
    Active,
    Delayed,
    Paused,
    Completed,
    Failed,
    Stuck,
}

impl JobStatus {
    /// Normalize a queue backend's native status string.
    ///
    /// The mapping is exhaustive and case-sensitive. Unknown native
    /// states fall back to `Waiting` — a deliberate leniency so a
    /// backend vocabulary drift degrades to "queued" rather than an
    /// error. Callers that care should log the fallback.
    pub fn from_native(native: &str) -> Self {
        match native {
            "waiting" => JobStatus::Waiting,
            "active" => JobStatus::Active,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "delayed" => JobStatus::Delayed,
            "paused" => JobStatus::Paused,
            "stuck" => JobStatus::Stuck,
            _ => JobStatus::Waiting,
        }
    }

    /// Canonical wire representation (`"WAITING"`, `"ACTIVE"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Waiting => "WAITING",
            JobStatus::Active => "ACTIVE",
            JobStatus::Delayed => "DELAYED",
            JobStatus::Paused => "PAUSED",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Stuck => "STUCK",
        }
    }

    /// True for states that count as "active" in a user's job list
    /// (`Waiting`, `Active`, `Delayed`).
    pub fn is_open(self) -> bool {
        matches!(
            self,
            JobStatus::Waiting | JobStatus::Active | JobStatus::Delayed
        )
    }

    /// True for terminal states (`Completed`, `Failed`).
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
