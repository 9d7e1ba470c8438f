//! Shared helpers for the API integration tests.
//!
//! Builds the application router through the same [`build_app_router`]
//! used by the binary, so tests exercise the production middleware
//! stack (CORS, request ID, timeout, tracing, panic recovery). Requests
//! are sent with `tower::ServiceExt::oneshot` -- no TCP listener.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use pulsefit_api::config::ServerConfig;
use pulsefit_api::engine::{JobStatusAggregator, QueueDispatcher};
use pulsefit_api::router::build_app_router;
use pulsefit_api::state::AppState;
use pulsefit_api::ws::WsManager;
use pulsefit_core::Capability;
use pulsefit_events::JobEventBus;
use pulsefit_queue::{MemoryQueue, Processor, WorkQueue};

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        ws_heartbeat_secs: 30,
        queue_concurrency: 1,
    }
}

/// A fully wired application plus handles into its internals, so tests
/// can bind processors, simulate broker outages, and subscribe to the
/// event bus.
pub struct TestApp {
    pub router: Router,
    pub queues: HashMap<Capability, Arc<MemoryQueue>>,
    pub event_bus: Arc<JobEventBus>,
    pub ws_manager: Arc<WsManager>,
    pub worker_cancel: CancellationToken,
}

impl TestApp {
    /// Start one worker per queue with the given processor. Without this
    /// call, submitted jobs sit in `WAITING` forever, which is itself a
    /// useful fixture for status tests.
    pub fn start_workers(&self, processor: Arc<dyn Processor>) {
        for queue in self.queues.values() {
            queue.start_workers(Arc::clone(&processor), 1, self.worker_cancel.clone());
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.worker_cancel.cancel();
    }
}

/// Build the full application with one in-memory queue per capability.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let event_bus = Arc::new(JobEventBus::default());
    let ws_manager = Arc::new(WsManager::new());

    let mut queues = HashMap::new();
    let mut queue_handles: HashMap<Capability, Arc<dyn WorkQueue>> = HashMap::new();
    for capability in Capability::ALL {
        let queue = Arc::new(MemoryQueue::new(capability, Arc::clone(&event_bus)));
        queue_handles.insert(capability, Arc::clone(&queue) as Arc<dyn WorkQueue>);
        queues.insert(capability, queue);
    }

    let state = AppState {
        ws_manager: Arc::clone(&ws_manager),
        dispatcher: Arc::new(QueueDispatcher::new(queue_handles.clone())),
        aggregator: Arc::new(JobStatusAggregator::new(queue_handles)),
        event_bus: Arc::clone(&event_bus),
    };

    TestApp {
        router: build_app_router(state, &config),
        queues,
        event_bus,
        ws_manager,
        worker_cancel: CancellationToken::new(),
    }
}

/// Send a GET request to the router.
pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Send a POST request with a JSON body to the router.
pub async fn post_json(router: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll `GET /api/v1/jobs/{id}` until the job reaches the wanted status
/// or the attempt budget runs out. Returns the last status payload.
pub async fn poll_job_until(
    router: &Router,
    job_id: &str,
    wanted: &str,
    max_attempts: u32,
) -> serde_json::Value {
    let mut last = serde_json::Value::Null;
    for _ in 0..max_attempts {
        let response = get(router, &format!("/api/v1/jobs/{job_id}")).await;
        if response.status() == StatusCode::OK {
            let json = body_json(response).await;
            last = json["data"].clone();
            if last["status"] == wanted {
                return last;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    last
}
