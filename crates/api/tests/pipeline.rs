//! End-to-end pipeline tests: submit over HTTP, process with a bound
//! worker, observe progress events and terminal status.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{body_json, build_test_app, get, poll_job_until, post_json};

use pulsefit_core::JobRecord;
use pulsefit_events::{JobUpdateKind, NotifyError, ProgressNotifier, RoomSender};
use pulsefit_queue::{Processor, ProgressReporter};

// ---------------------------------------------------------------------------
// Test processors
// ---------------------------------------------------------------------------

/// Reports the standard progress milestones, then resolves with a fixed
/// result.
struct StepProcessor;

#[async_trait]
impl Processor for StepProcessor {
    async fn process(
        &self,
        record: &JobRecord,
        reporter: &dyn ProgressReporter,
    ) -> Result<serde_json::Value, String> {
        for step in [10u8, 50, 90, 100] {
            reporter.report(step).await;
        }
        Ok(serde_json::json!({"plan": "done", "for": record.owner_id}))
    }
}

/// Always fails, to drive the retry machinery to exhaustion.
struct FailingProcessor;

#[async_trait]
impl Processor for FailingProcessor {
    async fn process(
        &self,
        _record: &JobRecord,
        _reporter: &dyn ProgressReporter,
    ) -> Result<serde_json::Value, String> {
        Err("model backend rejected the request".to_string())
    }
}

/// A room sender whose every delivery fails, simulating a notification
/// outage.
struct BrokenSender;

#[async_trait]
impl RoomSender for BrokenSender {
    async fn send_to_room(
        &self,
        _room: &str,
        _event: &str,
        _payload: &serde_json::Value,
    ) -> Result<(), NotifyError> {
        Err(NotifyError("socket layer down".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Scenario: submit -> progress -> completed with result
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submitted_job_runs_to_completion_with_result() {
    let app = build_test_app();
    app.start_workers(Arc::new(StepProcessor));

    let response = post_json(
        &app.router,
        "/api/v1/generations/workout",
        serde_json::json!({"owner_id": "runner", "payload": {"goal": "5k"}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    let job_id = json["data"]["job_id"].as_str().unwrap().to_string();

    let status = poll_job_until(&app.router, &job_id, "COMPLETED", 100).await;
    assert_eq!(status["status"], "COMPLETED");
    assert_eq!(status["progress"], 100);
    assert_eq!(status["result"]["plan"], "done");
    assert!(status.get("failure_reason").is_none());

    // Completed jobs no longer count as active.
    let response = get(&app.router, "/api/v1/users/runner/jobs/active").await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn lifecycle_events_published_in_order() {
    let app = build_test_app();
    let mut events = app.event_bus.subscribe();
    app.start_workers(Arc::new(StepProcessor));

    post_json(
        &app.router,
        "/api/v1/generations/meal",
        serde_json::json!({"owner_id": "runner", "payload": {}}),
    )
    .await;

    let mut kinds = Vec::new();
    loop {
        let update = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("event stream stalled")
            .expect("event bus closed");
        let terminal = matches!(
            update.kind,
            JobUpdateKind::Completed { .. } | JobUpdateKind::Failed { .. }
        );
        kinds.push(update.kind);
        if terminal {
            break;
        }
    }

    assert!(matches!(kinds.first(), Some(JobUpdateKind::Started)));
    let reported: Vec<u8> = kinds
        .iter()
        .filter_map(|k| match k {
            JobUpdateKind::Progress { progress } => Some(*progress),
            _ => None,
        })
        .collect();
    assert_eq!(reported, vec![10, 50, 90, 100]);
    assert!(matches!(kinds.last(), Some(JobUpdateKind::Completed { .. })));
}

// ---------------------------------------------------------------------------
// Scenario: retry exhaustion ends in FAILED, never re-enqueued
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn failing_job_exhausts_retries_and_reports_failed() {
    let app = build_test_app();
    app.start_workers(Arc::new(FailingProcessor));

    let response = post_json(
        &app.router,
        "/api/v1/generations/workout",
        serde_json::json!({"owner_id": "runner", "payload": {}}),
    )
    .await;
    let json = body_json(response).await;
    let job_id = json["data"]["job_id"].as_str().unwrap().to_string();

    let status = poll_job_until(&app.router, &job_id, "FAILED", 500).await;
    assert_eq!(status["status"], "FAILED");
    assert_eq!(
        status["failure_reason"],
        "model backend rejected the request"
    );
    assert!(status.get("result").is_none());

    // Terminal failure: the job never reappears in the active list.
    let response = get(&app.router, "/api/v1/users/runner/jobs/active").await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// Scenario: notification outage never alters the job outcome
// ---------------------------------------------------------------------------

#[tokio::test]
async fn notification_outage_does_not_affect_job_outcome() {
    let app = build_test_app();

    // Wire a notifier whose deliveries all fail.
    let notifier = ProgressNotifier::new(Arc::new(BrokenSender));
    let notifier_handle = tokio::spawn(notifier.run(app.event_bus.subscribe()));

    app.start_workers(Arc::new(StepProcessor));

    let response = post_json(
        &app.router,
        "/api/v1/generations/inbody-ocr",
        serde_json::json!({"owner_id": "scanner", "payload": {"image": "scan.png"}}),
    )
    .await;
    let json = body_json(response).await;
    let job_id = json["data"]["job_id"].as_str().unwrap().to_string();

    let status = poll_job_until(&app.router, &job_id, "COMPLETED", 100).await;
    assert_eq!(status["status"], "COMPLETED");
    assert_eq!(status["progress"], 100);

    notifier_handle.abort();
}
