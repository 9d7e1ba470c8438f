//! Generation job engine.
//!
//! Contains the dispatcher that places generation requests onto the
//! per-capability work queues and the aggregator that resolves job
//! status across all of them.

pub mod aggregator;
pub mod dispatcher;
pub mod simulated;

pub use aggregator::{JobStatusAggregator, JobStatusResponse, JobSummary};
pub use dispatcher::{JobHandle, QueueDispatcher};
pub use simulated::SimulatedProcessor;
