//! In-process work queue backend.
//!
//! [`MemoryQueue`] implements the full [`WorkQueue`] contract without an
//! external broker: priority dispatch with FIFO ties, bounded retry with
//! exponential backoff, the remove-on-success / retain-on-failure
//! eviction policy, queue pausing, and stuck-job detection. It stands in
//! for a durable broker in local deployments and tests; per-job mutual
//! exclusion is provided by the internal state lock, so a job is claimed
//! by at most one worker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

use pulsefit_core::job::RetryPolicy;
use pulsefit_core::types::JobId;
use pulsefit_core::{Capability, JobRecord};
use pulsefit_events::{JobEventBus, JobUpdate, JobUpdateKind};

use crate::error::QueueError;
use crate::work_queue::{EnqueueOptions, Processor, ProgressReporter, QueueJobView, WorkQueue};

/// How long completed jobs stay visible before lazy eviction
/// (`remove_on_complete`). A poll right after completion still observes
/// the terminal state; stale completed entries resolve to NotFound.
const DEFAULT_COMPLETED_RETENTION: Duration = Duration::from_secs(60);

/// An `active` job with no progress report within this window is
/// reported as native `stuck`.
const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Worker wakeup safety net when no enqueue notification arrives.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

struct StoredJob {
    record: JobRecord,
    opts: EnqueueOptions,
    native_status: &'static str,
    progress: u8,
    result: Option<serde_json::Value>,
    failure_reason: Option<String>,
    attempts_made: u32,
    /// Submission sequence; breaks priority ties FIFO.
    seq: u64,
    last_progress_at: Instant,
    finished_at: Option<Instant>,
}

struct QueueState {
    jobs: HashMap<JobId, StoredJob>,
    next_seq: u64,
    paused: bool,
}

// ---------------------------------------------------------------------------
// MemoryQueue
// ---------------------------------------------------------------------------

/// In-memory [`WorkQueue`] for one capability.
///
/// Designed to be wrapped in `Arc` and shared between the dispatcher,
/// the aggregator, and its own worker tasks. Retry timers hold their
/// own handles to the interior state, so a queue handle may be dropped
/// while backoffs are still pending.
pub struct MemoryQueue {
    capability: Capability,
    bus: Arc<JobEventBus>,
    state: Arc<Mutex<QueueState>>,
    /// Simulates broker reachability; when false, submissions fail
    /// synchronously.
    available: AtomicBool,
    /// Wakes one worker per newly runnable job.
    work_ready: Arc<Notify>,
    completed_retention: Duration,
    stall_timeout: Duration,
}

impl MemoryQueue {
    pub fn new(capability: Capability, bus: Arc<JobEventBus>) -> Self {
        Self {
            capability,
            bus,
            state: Arc::new(Mutex::new(QueueState {
                jobs: HashMap::new(),
                next_seq: 0,
                paused: false,
            })),
            available: AtomicBool::new(true),
            work_ready: Arc::new(Notify::new()),
            completed_retention: DEFAULT_COMPLETED_RETENTION,
            stall_timeout: DEFAULT_STALL_TIMEOUT,
        }
    }

    /// Override the completed-job retention window.
    pub fn with_completed_retention(mut self, retention: Duration) -> Self {
        self.completed_retention = retention;
        self
    }

    /// Override the stall timeout for stuck detection.
    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = timeout;
        self
    }

    /// Toggle simulated broker reachability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Stop dispatching; waiting jobs report native `paused`.
    pub async fn pause(&self) {
        self.state.lock().await.paused = true;
        tracing::info!(queue = self.capability.queue_name(), "Queue paused");
    }

    /// Resume dispatching.
    pub async fn resume(&self) {
        self.state.lock().await.paused = false;
        self.work_ready.notify_one();
        tracing::info!(queue = self.capability.queue_name(), "Queue resumed");
    }

    /// Spawn `concurrency` worker loops bound to `processor`.
    ///
    /// Exactly one processor is bound per queue. The loops run until
    /// the cancellation token is triggered.
    pub fn start_workers(
        self: &Arc<Self>,
        processor: Arc<dyn Processor>,
        concurrency: usize,
        cancel: CancellationToken,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        tracing::info!(
            queue = self.capability.queue_name(),
            concurrency,
            "Queue workers started",
        );
        (0..concurrency.max(1))
            .map(|_| {
                let queue = Arc::clone(self);
                let processor = Arc::clone(&processor);
                let cancel = cancel.clone();
                tokio::spawn(async move { queue.worker_loop(processor, cancel).await })
            })
            .collect()
    }

    async fn worker_loop(
        self: Arc<Self>,
        processor: Arc<dyn Processor>,
        cancel: CancellationToken,
    ) {
        loop {
            if cancel.is_cancelled() {
                break;
            }
            match self.claim_next().await {
                Some(record) => self.run_job(processor.as_ref(), record).await,
                None => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = self.work_ready.notified() => {}
                        _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => {}
                    }
                }
            }
        }
        tracing::debug!(queue = self.capability.queue_name(), "Queue worker stopped");
    }

    /// Claim the runnable job with the highest priority, ties broken by
    /// submission order. Holding the state lock for the whole claim
    /// guarantees at-most-one worker per job.
    async fn claim_next(&self) -> Option<JobRecord> {
        let mut state = self.state.lock().await;
        if state.paused {
            return None;
        }
        let id = state
            .jobs
            .values()
            .filter(|j| j.native_status == "waiting")
            .max_by_key(|j| (j.record.priority, std::cmp::Reverse(j.seq)))
            .map(|j| j.record.id.clone())?;

        let job = state.jobs.get_mut(&id)?;
        job.native_status = "active";
        job.attempts_made += 1;
        job.last_progress_at = Instant::now();
        Some(job.record.clone())
    }

    async fn run_job(&self, processor: &dyn Processor, record: JobRecord) {
        tracing::info!(
            queue = self.capability.queue_name(),
            job_id = %record.id,
            owner_id = %record.owner_id,
            "Job picked up",
        );
        self.bus.publish(JobUpdate::new(
            record.id.clone(),
            record.capability,
            record.owner_id.clone(),
            JobUpdateKind::Started,
        ));

        let reporter = MemoryReporter {
            queue: self,
            record: &record,
        };

        match processor.process(&record, &reporter).await {
            Ok(result) => self.complete_job(&record, result).await,
            Err(reason) => self.fail_attempt(&record, reason).await,
        }
    }

    async fn complete_job(&self, record: &JobRecord, result: serde_json::Value) {
        {
            let mut state = self.state.lock().await;
            if let Some(job) = state.jobs.get_mut(&record.id) {
                job.native_status = "completed";
                job.progress = 100;
                job.result = Some(result.clone());
                job.finished_at = Some(Instant::now());
            }
        }
        tracing::info!(
            queue = self.capability.queue_name(),
            job_id = %record.id,
            "Job completed",
        );
        self.bus.publish(JobUpdate::new(
            record.id.clone(),
            record.capability,
            record.owner_id.clone(),
            JobUpdateKind::Completed { result },
        ));
    }

    /// Record a failed attempt: re-queue after exponential backoff while
    /// budget remains, otherwise mark terminally failed. Failed jobs are
    /// retained for inspection and never re-enqueued by the pipeline.
    async fn fail_attempt(&self, record: &JobRecord, reason: String) {
        let retry_in = {
            let mut state = self.state.lock().await;
            let Some(job) = state.jobs.get_mut(&record.id) else {
                // Removed by an operator mid-flight; nothing to record.
                return;
            };
            if job.attempts_made < job.opts.attempts {
                job.native_status = "delayed";
                let policy = RetryPolicy {
                    max_attempts: job.opts.attempts,
                    base_delay: job.opts.backoff_base,
                };
                Some(policy.delay_after(job.attempts_made))
            } else {
                job.native_status = "failed";
                job.failure_reason = Some(reason.clone());
                job.finished_at = Some(Instant::now());
                if !job.opts.keep_failed {
                    state.jobs.remove(&record.id);
                }
                None
            }
        };

        match retry_in {
            Some(delay) => {
                tracing::warn!(
                    queue = self.capability.queue_name(),
                    job_id = %record.id,
                    error = %reason,
                    retry_in_ms = delay.as_millis() as u64,
                    "Job attempt failed, retrying",
                );
                self.schedule_retry(record.id.clone(), delay);
            }
            None => {
                tracing::error!(
                    queue = self.capability.queue_name(),
                    job_id = %record.id,
                    error = %reason,
                    "Job failed terminally",
                );
                self.bus.publish(JobUpdate::new(
                    record.id.clone(),
                    record.capability,
                    record.owner_id.clone(),
                    JobUpdateKind::Failed { reason },
                ));
            }
        }
    }

    /// Move a delayed job back to `waiting` once its backoff elapses.
    /// Retries are silent on the bus; only terminal states notify.
    fn schedule_retry(&self, job_id: JobId, delay: Duration) {
        let state = Arc::clone(&self.state);
        let work_ready = Arc::clone(&self.work_ready);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = state.lock().await;
            if let Some(job) = state.jobs.get_mut(&job_id) {
                if job.native_status == "delayed" {
                    job.native_status = "waiting";
                    work_ready.notify_one();
                }
            }
        });
    }

    /// Evict completed jobs past the retention window. Called under the
    /// state lock from read paths.
    fn sweep_expired(&self, state: &mut QueueState) {
        let retention = self.completed_retention;
        state.jobs.retain(|_, job| {
            !(job.native_status == "completed"
                && job.opts.remove_on_complete
                && job
                    .finished_at
                    .is_some_and(|done| done.elapsed() >= retention))
        });
    }

    /// Build the externally visible snapshot, deriving `stuck` for
    /// active jobs that have stalled and `paused` for waiting jobs on a
    /// paused queue.
    fn view_of(&self, job: &StoredJob, paused: bool) -> QueueJobView {
        let native_status = match job.native_status {
            "active" if job.last_progress_at.elapsed() >= self.stall_timeout => "stuck",
            "waiting" if paused => "paused",
            other => other,
        };
        QueueJobView {
            record: job.record.clone(),
            native_status: native_status.to_string(),
            progress: job.progress,
            result: job.result.clone(),
            failure_reason: job.failure_reason.clone(),
            attempts_made: job.attempts_made,
        }
    }

    fn ensure_available(&self) -> Result<(), QueueError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(QueueError::Unavailable(format!(
                "{} queue is not accepting submissions",
                self.capability.queue_name()
            )))
        }
    }
}

#[async_trait::async_trait]
impl WorkQueue for MemoryQueue {
    fn capability(&self) -> Capability {
        self.capability
    }

    async fn enqueue(&self, record: JobRecord, opts: EnqueueOptions) -> Result<(), QueueError> {
        self.ensure_available()?;

        let mut state = self.state.lock().await;
        if state.jobs.contains_key(&record.id) {
            // The deterministic ID doubles as the dedup key: a repeat
            // submission of a held ID is ignored, not duplicated.
            tracing::debug!(
                queue = self.capability.queue_name(),
                job_id = %record.id,
                "Duplicate enqueue ignored",
            );
            return Ok(());
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        tracing::info!(
            queue = self.capability.queue_name(),
            job_id = %record.id,
            owner_id = %record.owner_id,
            priority = record.priority,
            "Job enqueued",
        );
        state.jobs.insert(
            record.id.clone(),
            StoredJob {
                record,
                opts,
                native_status: "waiting",
                progress: 0,
                result: None,
                failure_reason: None,
                attempts_made: 0,
                seq,
                last_progress_at: Instant::now(),
                finished_at: None,
            },
        );
        drop(state);

        self.work_ready.notify_one();
        Ok(())
    }

    async fn find(&self, job_id: &str) -> Result<Option<QueueJobView>, QueueError> {
        let mut state = self.state.lock().await;
        self.sweep_expired(&mut state);
        let paused = state.paused;
        Ok(state.jobs.get(job_id).map(|job| self.view_of(job, paused)))
    }

    async fn list_open(&self) -> Result<Vec<QueueJobView>, QueueError> {
        let mut state = self.state.lock().await;
        self.sweep_expired(&mut state);
        let paused = state.paused;
        let mut open: Vec<_> = state
            .jobs
            .values()
            .filter(|j| matches!(j.native_status, "waiting" | "active" | "delayed"))
            .collect();
        // Intra-queue ordering guarantee: priority, then FIFO.
        open.sort_by_key(|j| (std::cmp::Reverse(j.record.priority), j.seq));
        Ok(open.into_iter().map(|j| self.view_of(j, paused)).collect())
    }

    async fn remove(&self, job_id: &str) -> Result<bool, QueueError> {
        let removed = self.state.lock().await.jobs.remove(job_id).is_some();
        if removed {
            tracing::info!(
                queue = self.capability.queue_name(),
                job_id,
                "Job removed from queue",
            );
        }
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress side-channel bound to one in-flight job.
struct MemoryReporter<'a> {
    queue: &'a MemoryQueue,
    record: &'a JobRecord,
}

#[async_trait::async_trait]
impl ProgressReporter for MemoryReporter<'_> {
    async fn report(&self, progress: u8) {
        let progress = progress.min(100);
        {
            let mut state = self.queue.state.lock().await;
            if let Some(job) = state.jobs.get_mut(&self.record.id) {
                // Monotonic in queue state even if reports arrive out
                // of order; the raw value still goes out on the bus.
                job.progress = job.progress.max(progress);
                job.last_progress_at = Instant::now();
            }
        }
        self.queue.bus.publish(JobUpdate::new(
            self.record.id.clone(),
            self.record.capability,
            self.record.owner_id.clone(),
            JobUpdateKind::Progress { progress },
        ));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
