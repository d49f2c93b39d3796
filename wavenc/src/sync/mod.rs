//! Synchronization primitives coordinating the producer and the workers.
//!
//! - [`BoundedQueue`]: blocking FIFO providing backpressure
//! - [`CompletionTracker`]: outstanding-work counter used to detect the end of a run

pub mod queue;
pub mod tracker;

pub use queue::BoundedQueue;
pub use tracker::CompletionTracker;
