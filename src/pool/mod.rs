//! Bounded-concurrency admission control.
//!
//! This module is the core of the crate: [`ExecutionPool`] accepts task
//! submissions, keeps them waiting in priority order, and admits them into
//! a running set that never exceeds the configured capacity.

mod engine;
mod entry;

pub use engine::ExecutionPool;
pub use entry::{StartFn, StartFuture, TaskCompletion, TaskSummary};
