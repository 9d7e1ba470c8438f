//! Job record value object, ID scheme, and retry policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::types::{JobId, OwnerId, Timestamp};

/// Retry budget applied to every generation job, regardless of capability.
pub const MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff between retry attempts.
pub const BACKOFF_BASE: Duration = Duration::from_millis(2000);

/// One submitted generation request.
///
/// Immutable after submission: retry bookkeeping (attempts made, next
/// backoff) is owned by the queue backend, never by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Deterministic ID, see [`JobRecord::make_id`].
    pub id: JobId,
    /// Selects the work queue this record is enqueued on.
    pub capability: Capability,
    /// The requesting user. Used to filter active-job listings.
    pub owner_id: OwnerId,
    /// Capability-specific generation input. Opaque to the pipeline.
    pub payload: serde_json::Value,
    /// Higher values are dispatched sooner within the same queue.
    pub priority: i32,
    /// Submission time (UTC).
    pub created_at: Timestamp,
}

impl JobRecord {
    /// Build a record for submission at `now`, deriving the job ID from
    /// the capability, owner, and submission time.
    pub fn new(
        capability: Capability,
        owner_id: impl Into<OwnerId>,
        payload: serde_json::Value,
        priority: i32,
        now: Timestamp,
    ) -> Self {
        let owner_id = owner_id.into();
        Self {
            id: Self::make_id(capability, &owner_id, now),
            capability,
            owner_id,
            payload,
            priority,
            created_at: now,
        }
    }

    /// Deterministic job ID: `"{prefix}-{owner_id}-{epoch_millis}"`.
    ///
    /// The time component keeps rapid repeat submissions from one owner
    /// on distinct IDs while staying traceable to the owner. Two
    /// submissions in the same millisecond may collide; dedup is
    /// time-based, not content-based.
    pub fn make_id(capability: Capability, owner_id: &str, at: Timestamp) -> JobId {
        format!(
            "{}-{}-{}",
            capability.prefix(),
            owner_id,
            at.timestamp_millis()
        )
    }
}

/// Retry policy attached to a job at enqueue time.
///
/// Exponential backoff: attempt `n` (1-based) waits
/// `base * 2^(n-1)` before re-entering the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first run.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per subsequent attempt.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Backoff delay after the given failed attempt (1-based).
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        let exp = failed_attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exp)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay: BACKOFF_BASE,
        }
    }
}
