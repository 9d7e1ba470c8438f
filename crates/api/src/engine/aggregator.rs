//! Cross-queue job status aggregation.
//!
//! A job lives on exactly one of the per-capability work queues, but
//! callers address it by ID alone. The aggregator fans out lookups to
//! every queue concurrently (one round trip per queue, never
//! sequential probing) and normalizes each backend's native state into
//! the canonical [`JobStatus`].

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use pulsefit_core::progress::phase_message;
use pulsefit_core::types::JobId;
use pulsefit_core::{Capability, JobStatus};
use pulsefit_queue::{QueueError, QueueJobView, WorkQueue};

/// Full status of one job, as returned by `GET /jobs/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusResponse {
    pub id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    /// Populated only when `status == COMPLETED`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Populated only when `status == FAILED`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// One entry in a user's active-job listing.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub capability: Capability,
    pub status: JobStatus,
    pub progress: u8,
    pub phase_message: &'static str,
}

/// Resolves jobs by ID or owner across all work queues.
pub struct JobStatusAggregator {
    queues: HashMap<Capability, Arc<dyn WorkQueue>>,
}

impl JobStatusAggregator {
    pub fn new(queues: HashMap<Capability, Arc<dyn WorkQueue>>) -> Self {
        Self { queues }
    }

    /// Look up a job by ID across all queues.
    ///
    /// `Ok(None)` is a normal outcome: completed-and-evicted or
    /// operator-removed jobs are no longer held anywhere. A queue error
    /// only propagates when no other queue produced the job.
    pub async fn get_status(&self, job_id: &str) -> Result<Option<JobStatusResponse>, QueueError> {
        let lookups = self.queues.values().map(|queue| queue.find(job_id));
        let results = join_all(lookups).await;

        let mut first_err = None;
        for result in results {
            match result {
                Ok(Some(view)) => return Ok(Some(Self::status_response(view))),
                Ok(None) => {}
                Err(e) => first_err = first_err.or(Some(e)),
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// List one user's open jobs (`WAITING`/`ACTIVE`/`DELAYED`) across
    /// all queues.
    ///
    /// Per-queue result lists are concatenated; queue iteration order
    /// is not a result ordering guarantee — only intra-queue
    /// priority/FIFO order is preserved.
    pub async fn list_active_for_user(&self, owner_id: &str) -> Result<Vec<JobSummary>, QueueError> {
        let listings = self.queues.values().map(|queue| queue.list_open());
        let results = join_all(listings).await;

        let mut summaries = Vec::new();
        for result in results {
            let views = result?;
            summaries.extend(
                views
                    .into_iter()
                    .filter(|v| v.record.owner_id == owner_id && v.status().is_open())
                    .map(Self::summary),
            );
        }
        Ok(summaries)
    }

    fn status_response(view: QueueJobView) -> JobStatusResponse {
        let status = view.status();
        JobStatusResponse {
            id: view.record.id,
            status,
            progress: view.progress,
            result: (status == JobStatus::Completed)
                .then_some(view.result)
                .flatten(),
            failure_reason: (status == JobStatus::Failed)
                .then_some(view.failure_reason)
                .flatten(),
        }
    }

    fn summary(view: QueueJobView) -> JobSummary {
        JobSummary {
            job_id: view.record.id.clone(),
            capability: view.record.capability,
            status: view.status(),
            progress: view.progress,
            phase_message: phase_message(view.progress),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pulsefit_core::JobRecord;
    use pulsefit_queue::EnqueueOptions;
    use tokio::sync::Mutex;

    /// Scriptable queue stub: serves canned views, optionally erroring.
    struct StubQueue {
        capability: Capability,
        views: Mutex<Vec<QueueJobView>>,
        fail_lookups: bool,
    }

    impl StubQueue {
        fn new(capability: Capability) -> Self {
            Self {
                capability,
                views: Mutex::new(Vec::new()),
                fail_lookups: false,
            }
        }

        fn failing(capability: Capability) -> Self {
            Self {
                fail_lookups: true,
                ..Self::new(capability)
            }
        }

        async fn put(&self, owner: &str, native_status: &str, progress: u8) -> JobId {
            let mut views = self.views.lock().await;
            let at = chrono::Utc::now() + chrono::Duration::milliseconds(views.len() as i64);
            let record = JobRecord::new(self.capability, owner, serde_json::json!({}), 0, at);
            let id = record.id.clone();
            views.push(QueueJobView {
                record,
                native_status: native_status.to_string(),
                progress,
                result: (native_status == "completed")
                    .then(|| serde_json::json!({"plan": "done"})),
                failure_reason: (native_status == "failed").then(|| "boom".to_string()),
                attempts_made: 1,
            });
            id
        }
    }

    #[async_trait::async_trait]
    impl WorkQueue for StubQueue {
        fn capability(&self) -> Capability {
            self.capability
        }

        async fn enqueue(&self, _: JobRecord, _: EnqueueOptions) -> Result<(), QueueError> {
            unimplemented!("aggregator never enqueues")
        }

        async fn find(&self, job_id: &str) -> Result<Option<QueueJobView>, QueueError> {
            if self.fail_lookups {
                return Err(QueueError::Unavailable("stub offline".into()));
            }
            Ok(self
                .views
                .lock()
                .await
                .iter()
                .find(|v| v.record.id == job_id)
                .cloned())
        }

        async fn list_open(&self) -> Result<Vec<QueueJobView>, QueueError> {
            if self.fail_lookups {
                return Err(QueueError::Unavailable("stub offline".into()));
            }
            Ok(self
                .views
                .lock()
                .await
                .iter()
                .filter(|v| matches!(v.native_status.as_str(), "waiting" | "active" | "delayed"))
                .cloned()
                .collect())
        }

        async fn remove(&self, _: &str) -> Result<bool, QueueError> {
            Ok(false)
        }
    }

    fn aggregator_of(queues: Vec<Arc<StubQueue>>) -> JobStatusAggregator {
        JobStatusAggregator::new(
            queues
                .into_iter()
                .map(|q| (q.capability(), q as Arc<dyn WorkQueue>))
                .collect(),
        )
    }

    #[tokio::test]
    async fn resolves_job_regardless_of_holding_queue() {
        let workout = Arc::new(StubQueue::new(Capability::Workout));
        let meal = Arc::new(StubQueue::new(Capability::Meal));
        let inbody = Arc::new(StubQueue::new(Capability::InbodyOcr));

        let meal_job = meal.put("u1", "active", 30).await;
        let inbody_job = inbody.put("u2", "waiting", 0).await;

        let agg = aggregator_of(vec![workout, meal, inbody]);

        let status = agg.get_status(&meal_job).await.unwrap().unwrap();
        assert_eq!(status.status, JobStatus::Active);
        assert_eq!(status.progress, 30);

        let status = agg.get_status(&inbody_job).await.unwrap().unwrap();
        assert_eq!(status.status, JobStatus::Waiting);
    }

    #[tokio::test]
    async fn unknown_id_is_none_not_an_error() {
        let agg = aggregator_of(vec![
            Arc::new(StubQueue::new(Capability::Workout)),
            Arc::new(StubQueue::new(Capability::Meal)),
        ]);

        assert!(agg.get_status("nonexistent-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn result_only_on_completed_reason_only_on_failed() {
        let workout = Arc::new(StubQueue::new(Capability::Workout));
        let done = workout.put("u1", "completed", 100).await;
        let dead = workout.put("u1", "failed", 40).await;
        let agg = aggregator_of(vec![workout]);

        let status = agg.get_status(&done).await.unwrap().unwrap();
        assert_eq!(status.status, JobStatus::Completed);
        assert!(status.result.is_some());
        assert!(status.failure_reason.is_none());

        let status = agg.get_status(&dead).await.unwrap().unwrap();
        assert_eq!(status.status, JobStatus::Failed);
        assert!(status.result.is_none());
        assert_eq!(status.failure_reason.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn unknown_native_status_normalizes_to_waiting() {
        let workout = Arc::new(StubQueue::new(Capability::Workout));
        let odd = workout.put("u1", "initializing", 0).await;
        let agg = aggregator_of(vec![workout]);

        let status = agg.get_status(&odd).await.unwrap().unwrap();
        assert_eq!(status.status, JobStatus::Waiting);
    }

    #[tokio::test]
    async fn found_job_wins_over_another_queues_error() {
        let healthy = Arc::new(StubQueue::new(Capability::Workout));
        let offline = Arc::new(StubQueue::failing(Capability::Meal));
        let job = healthy.put("u1", "active", 50).await;

        let agg = aggregator_of(vec![healthy, offline]);
        let status = agg.get_status(&job).await.unwrap().unwrap();
        assert_eq!(status.status, JobStatus::Active);
    }

    #[tokio::test]
    async fn lookup_error_propagates_when_job_not_found() {
        let healthy = Arc::new(StubQueue::new(Capability::Workout));
        let offline = Arc::new(StubQueue::failing(Capability::Meal));

        let agg = aggregator_of(vec![healthy, offline]);
        let err = agg.get_status("missing").await.expect_err("should surface");
        assert!(matches!(err, QueueError::Unavailable(_)));
    }

    #[tokio::test]
    async fn active_listing_is_isolated_per_owner() {
        let workout = Arc::new(StubQueue::new(Capability::Workout));
        let meal = Arc::new(StubQueue::new(Capability::Meal));

        workout.put("u1", "active", 60).await;
        workout.put("u2", "waiting", 0).await;
        meal.put("u1", "delayed", 0).await;
        meal.put("u3", "active", 10).await;
        // Terminal and paused jobs never appear in the active list.
        meal.put("u1", "completed", 100).await;

        let agg = aggregator_of(vec![workout, meal]);
        let jobs = agg.list_active_for_user("u1").await.unwrap();

        assert_eq!(jobs.len(), 2);
        for job in &jobs {
            assert!(job.status.is_open());
        }
        let caps: Vec<_> = jobs.iter().map(|j| j.capability).collect();
        assert!(caps.contains(&Capability::Workout));
        assert!(caps.contains(&Capability::Meal));
    }

    #[tokio::test]
    async fn summary_carries_phase_message() {
        let workout = Arc::new(StubQueue::new(Capability::Workout));
        workout.put("u1", "active", 92).await;

        let agg = aggregator_of(vec![workout]);
        let jobs = agg.list_active_for_user("u1").await.unwrap();
        assert_eq!(jobs[0].phase_message, "Finalizing plan...");
    }
}
