//! Generation job dispatcher.
//!
//! The single writer of job metadata at submission time: constructs the
//! job record, derives the deterministic dedup ID, and enqueues onto
//! the work queue selected by capability. Does not block on execution.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use pulsefit_core::types::JobId;
use pulsefit_core::{Capability, JobRecord};
use pulsefit_queue::{EnqueueOptions, QueueError, WorkQueue};

/// Handle returned to the caller after a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct JobHandle {
    pub job_id: JobId,
}

/// Submits generation jobs onto the per-capability work queues.
///
/// Queue handles are explicit, injected collaborators — one per
/// capability, no ambient registry — so tests can substitute any
/// [`WorkQueue`] backend.
pub struct QueueDispatcher {
    queues: HashMap<Capability, Arc<dyn WorkQueue>>,
}

impl QueueDispatcher {
    /// Build a dispatcher over the given queue handles.
    ///
    /// Expects one handle per capability; submitting to a capability
    /// without a queue fails with [`QueueError::Unavailable`].
    pub fn new(queues: HashMap<Capability, Arc<dyn WorkQueue>>) -> Self {
        Self { queues }
    }

    /// Submit a generation request.
    ///
    /// Assigns the time-based dedup ID, applies the standard retry
    /// policy (3 attempts, exponential backoff from 2 s) and eviction
    /// policy (remove on success, retain on terminal failure), and
    /// returns as soon as the queue has accepted the record. A broker
    /// outage surfaces synchronously as [`QueueError::Unavailable`].
    pub async fn submit(
        &self,
        capability: Capability,
        owner_id: &str,
        payload: serde_json::Value,
        priority: i32,
    ) -> Result<JobHandle, QueueError> {
        let queue = self.queues.get(&capability).ok_or_else(|| {
            QueueError::Unavailable(format!("No queue configured for capability {capability}"))
        })?;

        let record = JobRecord::new(capability, owner_id, payload, priority, chrono::Utc::now());
        let job_id = record.id.clone();

        queue.enqueue(record, EnqueueOptions::default()).await?;

        tracing::info!(
            job_id = %job_id,
            capability = %capability,
            owner_id,
            priority,
            "Generation job submitted",
        );

        Ok(JobHandle { job_id })
    }
}
