//! PulseFit domain layer for the generation job pipeline.
//!
//! Framework-free building blocks shared by the queue backends, the
//! event/notification infrastructure, and the API engine:
//!
//! - [`Capability`] — the three generation domains, each mapping 1:1 to
//!   a work queue.
//! - [`JobStatus`] — the canonical seven-value lifecycle state and the
//!   native-status normalization.
//! - [`JobRecord`] — the submitted job value object and its
//!   deterministic ID scheme.
//! - [`RetryPolicy`] — attempts budget and exponential backoff.
//! - [`progress`] — progress-to-phase-message derivation.
//! - [`job_events`] / [`rooms`] — the WebSocket event and room naming
//!   vocabulary.

pub mod capability;
pub mod error;
pub mod job;
pub mod job_events;
pub mod progress;
pub mod rooms;
pub mod status;
pub mod types;

pub use capability::Capability;
pub use error::CoreError;
pub use job::{JobRecord, RetryPolicy};
pub use status::JobStatus;
