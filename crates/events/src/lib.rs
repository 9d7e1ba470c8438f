//! PulseFit event bus and notification infrastructure.
//!
//! Building blocks for real-time job lifecycle reporting:
//!
//! - [`JobEventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`JobUpdate`] — the canonical job lifecycle event envelope the
//!   queue workers produce.
//! - [`ProgressNotifier`] — background consumer that maps updates to
//!   room-scoped WebSocket events.
//! - [`RoomSender`] — the transport seam the notifier delivers through.

pub mod bus;
pub mod notifier;

pub use bus::{JobEventBus, JobUpdate, JobUpdateKind};
pub use notifier::{NotifyError, ProgressNotifier, RoomSender};
