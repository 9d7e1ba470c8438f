//! Room name vocabulary for real-time notification delivery.
//!
//! A room is a named broadcast group of WebSocket connections. The
//! notifier only ever targets these three kinds of rooms.

/// Operational events for administrators.
pub const ROOM_ADMIN: &str = "admin";

/// System-wide events for every connected client.
pub const ROOM_BROADCAST: &str = "broadcast";

/// Per-user room name: `user:{owner_id}`.
pub fn user_room(owner_id: &str) -> String {
    format!("user:{owner_id}")
}
