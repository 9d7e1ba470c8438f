//! Work queue contracts and backends for the generation pipeline.
//!
//! - [`WorkQueue`] — the durable per-capability broker contract the
//!   dispatcher and aggregator are written against.
//! - [`Processor`] — the worker-side contract (process + progress
//!   side-channel).
//! - [`MemoryQueue`] — an in-process backend implementing the full
//!   contract: priority dispatch with FIFO ties, bounded retry with
//!   exponential backoff, eviction policy, pause, and stuck detection.

pub mod error;
pub mod memory;
pub mod work_queue;

pub use error::QueueError;
pub use memory::MemoryQueue;
pub use work_queue::{EnqueueOptions, Processor, ProgressReporter, QueueJobView, WorkQueue};
