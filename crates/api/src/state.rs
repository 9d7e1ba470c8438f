use std::sync::Arc;

use pulsefit_events::JobEventBus;

use crate::engine::{JobStatusAggregator, QueueDispatcher};
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// WebSocket connection manager (browser/mobile clients).
    pub ws_manager: Arc<WsManager>,
    /// Submits generation jobs onto the per-capability work queues.
    pub dispatcher: Arc<QueueDispatcher>,
    /// Resolves job status across all work queues.
    pub aggregator: Arc<JobStatusAggregator>,
    /// Job lifecycle event bus (workers publish, the notifier consumes).
    /// Handlers read its subscriber count for health reporting.
    pub event_bus: Arc<JobEventBus>,
}
