//! The work queue and processor contracts.
//!
//! A work queue is an ordered, at-least-once delivery channel of job
//! records for exactly one capability. The dispatcher and aggregator
//! depend only on this trait; the backing broker is interchangeable.

use std::time::Duration;

use pulsefit_core::job::{BACKOFF_BASE, MAX_ATTEMPTS};
use pulsefit_core::{Capability, JobRecord, JobStatus};

use crate::error::QueueError;

// ---------------------------------------------------------------------------
// Enqueue options
// ---------------------------------------------------------------------------

/// Per-job policy fixed at enqueue time.
///
/// After submission the queue owns all retry bookkeeping; the core
/// never mutates these.
#[derive(Debug, Clone, Copy)]
pub struct EnqueueOptions {
    /// Total attempt budget, including the first run.
    pub attempts: u32,
    /// Base delay for exponential backoff (doubles per attempt).
    pub backoff_base: Duration,
    /// Evict the job after successful completion (after the backend's
    /// retention window), so old completed jobs resolve to NotFound.
    pub remove_on_complete: bool,
    /// Retain terminally failed jobs for inspection until externally
    /// purged.
    pub keep_failed: bool,
}

impl Default for EnqueueOptions {
    fn default() -> Self {
        Self {
            attempts: MAX_ATTEMPTS,
            backoff_base: BACKOFF_BASE,
            remove_on_complete: true,
            keep_failed: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Job view
// ---------------------------------------------------------------------------

/// Snapshot of one job as reported by a queue backend.
#[derive(Debug, Clone)]
pub struct QueueJobView {
    pub record: JobRecord,
    /// The backend's native state vocabulary (e.g. `"waiting"`,
    /// `"active"`). Normalize with [`JobStatus::from_native`].
    pub native_status: String,
    /// Last reported progress, 0..=100.
    pub progress: u8,
    /// Present only once the job completed.
    pub result: Option<serde_json::Value>,
    /// Present only once the job failed terminally.
    pub failure_reason: Option<String>,
    /// Attempts started so far (1 after first pickup).
    pub attempts_made: u32,
}

impl QueueJobView {
    /// Canonical status for this snapshot.
    pub fn status(&self) -> JobStatus {
        JobStatus::from_native(&self.native_status)
    }
}

// ---------------------------------------------------------------------------
// WorkQueue trait
// ---------------------------------------------------------------------------

/// Durable, ordered job channel for one capability.
///
/// Within one queue, jobs are dispatched in priority order with FIFO
/// ties; no ordering is guaranteed across queues. Every method is an
/// async boundary (a network call on brokered backends).
#[async_trait::async_trait]
pub trait WorkQueue: Send + Sync {
    /// The capability this queue carries.
    fn capability(&self) -> Capability;

    /// Accept a job record. Fails synchronously with
    /// [`QueueError::Unavailable`] when the broker is unreachable.
    ///
    /// Re-enqueueing an ID the queue already holds is a no-op (the
    /// deterministic ID doubles as the dedup key).
    async fn enqueue(&self, record: JobRecord, opts: EnqueueOptions) -> Result<(), QueueError>;

    /// Look up a job by ID. `None` is a normal outcome: the job may
    /// have been completed-and-evicted or removed by an operator.
    async fn find(&self, job_id: &str) -> Result<Option<QueueJobView>, QueueError>;

    /// Snapshot all jobs in the open native states (`waiting`,
    /// `active`, `delayed`).
    async fn list_open(&self) -> Result<Vec<QueueJobView>, QueueError>;

    /// Operator deletion of a job in any state. Returns whether a job
    /// was removed; subsequent lookups must report `None`, not an
    /// error.
    async fn remove(&self, job_id: &str) -> Result<bool, QueueError>;
}

// ---------------------------------------------------------------------------
// Processor contract
// ---------------------------------------------------------------------------

/// Progress side-channel handed to a processor.
///
/// Reports flow into the queue's job state and onto the event bus; the
/// notifier consumes them at its own cadence.
#[async_trait::async_trait]
pub trait ProgressReporter: Send + Sync {
    /// Report progress in 0..=100. Values above 100 are clamped.
    async fn report(&self, progress: u8);
}

/// Worker-side contract: exactly one processor is bound per queue.
///
/// A returned `Err` feeds the queue's retry machinery; once the
/// attempt budget is exhausted the job becomes terminally failed. The
/// pipeline never re-submits failed jobs on its own.
#[async_trait::async_trait]
pub trait Processor: Send + Sync {
    async fn process(
        &self,
        job: &JobRecord,
        progress: &dyn ProgressReporter,
    ) -> Result<serde_json::Value, String>;
}
