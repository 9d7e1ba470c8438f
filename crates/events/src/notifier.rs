//! Progress notifier: maps job updates to room-scoped client events.
//!
//! [`ProgressNotifier`] subscribes to the [`JobEventBus`] and pushes
//! `{prefix}-generation-{phase}` events into per-user rooms through a
//! [`RoomSender`]. Delivery is best-effort: a failed or missing
//! recipient is logged and dropped, never promoted to a pipeline error.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

use pulsefit_core::job_events::{
    event_name, PHASE_COMPLETE, PHASE_ERROR, PHASE_PROGRESS, PHASE_STARTED,
};
use pulsefit_core::progress::phase_message;
use pulsefit_core::rooms::{user_room, ROOM_ADMIN, ROOM_BROADCAST};
use pulsefit_core::types::JobId;

use crate::bus::{JobUpdate, JobUpdateKind};

/// Delivery failure on the real-time transport.
///
/// Always swallowed by the notifier; exists so transport adapters have
/// a typed way to report what went wrong into the logs.
#[derive(Debug, thiserror::Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Transport seam: deliver one event to every connection in a room.
///
/// Room membership is owned by the transport layer (the WebSocket
/// manager); the notifier only names rooms.
#[async_trait::async_trait]
pub trait RoomSender: Send + Sync {
    async fn send_to_room(
        &self,
        room: &str,
        event: &str,
        payload: &serde_json::Value,
    ) -> Result<(), NotifyError>;
}

/// Routes job updates to connected clients.
pub struct ProgressNotifier {
    sender: Arc<dyn RoomSender>,
    /// Last progress seen per job. Progress delivery may be reordered
    /// in flight; stale (non-increasing) values are discarded so the
    /// displayed phase never regresses.
    last_progress: Mutex<HashMap<JobId, u8>>,
}

impl ProgressNotifier {
    pub fn new(sender: Arc<dyn RoomSender>) -> Self {
        Self {
            sender,
            last_progress: Mutex::new(HashMap::new()),
        }
    }

    /// Run the main notification loop.
    ///
    /// Consumes updates from the bus via `receiver` until the channel
    /// is closed (i.e. the [`JobEventBus`](crate::JobEventBus) is
    /// dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<JobUpdate>) {
        loop {
            match receiver.recv().await {
                Ok(update) => self.handle_update(&update).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Progress notifier lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, progress notifier shutting down");
                    break;
                }
            }
        }
    }

    /// Translate one update into a per-user room event.
    pub async fn handle_update(&self, update: &JobUpdate) {
        let (phase, payload) = match &update.kind {
            JobUpdateKind::Started => (
                PHASE_STARTED,
                serde_json::json!({ "job_id": update.job_id }),
            ),
            JobUpdateKind::Progress { progress } => {
                let progress = (*progress).min(100);
                if self.is_stale(&update.job_id, progress).await {
                    tracing::debug!(
                        job_id = %update.job_id,
                        progress,
                        "Discarding stale progress update",
                    );
                    return;
                }
                (
                    PHASE_PROGRESS,
                    serde_json::json!({
                        "job_id": update.job_id,
                        "progress": progress,
                        "phase_message": phase_message(progress),
                    }),
                )
            }
            JobUpdateKind::Completed { result } => {
                self.forget(&update.job_id).await;
                (
                    PHASE_COMPLETE,
                    serde_json::json!({ "job_id": update.job_id, "result": result }),
                )
            }
            JobUpdateKind::Failed { reason } => {
                self.forget(&update.job_id).await;
                (
                    PHASE_ERROR,
                    serde_json::json!({ "job_id": update.job_id, "reason": reason }),
                )
            }
        };

        let event = event_name(update.capability, phase);
        self.publish(&update.owner_id, &event, &payload).await;
    }

    /// Push an event to one user's room. Best-effort.
    pub async fn publish(&self, owner_id: &str, event: &str, payload: &serde_json::Value) {
        self.deliver(&user_room(owner_id), event, payload).await;
    }

    /// Push an operational event to the admin room. Best-effort.
    pub async fn publish_admin(&self, event: &str, payload: &serde_json::Value) {
        self.deliver(ROOM_ADMIN, event, payload).await;
    }

    /// Push a system-wide event to every connected client. Best-effort.
    pub async fn broadcast(&self, event: &str, payload: &serde_json::Value) {
        self.deliver(ROOM_BROADCAST, event, payload).await;
    }

    async fn deliver(&self, room: &str, event: &str, payload: &serde_json::Value) {
        if let Err(e) = self.sender.send_to_room(room, event, payload).await {
            // Notification loss is acceptable; the job pipeline must
            // never fail or retry because a recipient is unreachable.
            tracing::warn!(room, event, error = %e, "Dropped notification");
        }
    }

    /// Record `progress` for the job; true if it does not advance past
    /// the last-seen value.
    async fn is_stale(&self, job_id: &str, progress: u8) -> bool {
        let mut seen = self.last_progress.lock().await;
        match seen.get(job_id) {
            Some(last) if progress <= *last => true,
            _ => {
                seen.insert(job_id.to_string(), progress);
                false
            }
        }
    }

    async fn forget(&self, job_id: &str) {
        self.last_progress.lock().await.remove(job_id);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
