//! WebSocket infrastructure for real-time notification delivery.
//!
//! Provides room-aware connection management, heartbeat monitoring,
//! the HTTP upgrade handler used by Axum routes, and the adapter that
//! exposes the manager to the progress notifier as a
//! [`RoomSender`](pulsefit_events::RoomSender).

mod handler;
mod heartbeat;
pub mod manager;
mod sender;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
pub use sender::WsRoomSender;
