use std::sync::Arc;

use axum::extract::ws::Message;

use pulsefit_core::rooms::ROOM_BROADCAST;
use pulsefit_events::{NotifyError, RoomSender};

use crate::ws::manager::WsManager;

/// Adapts [`WsManager`] to the notifier's [`RoomSender`] seam.
///
/// Events go out as `{ "event": ..., "data": ... }` text frames. A room
/// with no members is not an error: delivery is best-effort and the
/// notifier swallows failures anyway.
pub struct WsRoomSender {
    ws_manager: Arc<WsManager>,
}

impl WsRoomSender {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }
}

#[async_trait::async_trait]
impl RoomSender for WsRoomSender {
    async fn send_to_room(
        &self,
        room: &str,
        event: &str,
        payload: &serde_json::Value,
    ) -> Result<(), NotifyError> {
        let frame = serde_json::json!({ "event": event, "data": payload });
        let message = Message::Text(frame.to_string().into());

        if room == ROOM_BROADCAST {
            self.ws_manager.broadcast(message).await;
        } else {
            let delivered = self.ws_manager.send_to_room(room, message).await;
            tracing::trace!(room, event, delivered, "Room event dispatched");
        }
        Ok(())
    }
}
