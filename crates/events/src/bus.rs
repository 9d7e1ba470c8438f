//! In-process job event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`JobEventBus`] decouples the queue workers (producers) from the
//! progress notifier (consumer): workers publish at processing cadence,
//! subscribers drain at their own pace. Designed to be shared via
//! `Arc<JobEventBus>` across the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use pulsefit_core::types::{JobId, OwnerId};
use pulsefit_core::Capability;

// ---------------------------------------------------------------------------
// JobUpdate
// ---------------------------------------------------------------------------

/// What happened to the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobUpdateKind {
    /// A worker picked the job up.
    Started,
    /// Progress report from the worker, 0..=100.
    Progress { progress: u8 },
    /// The job resolved with a generation result.
    Completed { result: serde_json::Value },
    /// The job failed terminally (retry budget exhausted).
    Failed { reason: String },
}

/// One job lifecycle event, as published by a queue worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobUpdate {
    pub job_id: JobId,
    pub capability: Capability,
    pub owner_id: OwnerId,
    pub kind: JobUpdateKind,
    /// When the update was published (UTC).
    pub timestamp: DateTime<Utc>,
}

impl JobUpdate {
    /// Create an update stamped with the current time.
    pub fn new(
        job_id: impl Into<JobId>,
        capability: Capability,
        owner_id: impl Into<OwnerId>,
        kind: JobUpdateKind,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            capability,
            owner_id: owner_id.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// JobEventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus for [`JobUpdate`]s.
///
/// Wraps a [`broadcast::Sender`] so any number of subscribers can
/// independently receive every published update.
pub struct JobEventBus {
    sender: broadcast::Sender<JobUpdate>,
}

impl JobEventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed updates are
    /// dropped and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an update to all current subscribers.
    ///
    /// Notification is a side channel: if there are no active
    /// subscribers the update is silently dropped.
    pub fn publish(&self, update: JobUpdate) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(update);
    }

    /// Subscribe to all updates published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<JobUpdate> {
        self.sender.subscribe()
    }

    /// Number of live subscriptions, for health reporting. A running
    /// deployment has at least one (the progress notifier).
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for JobEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
