//! corral - a bounded-concurrency execution pool for local shell tasks.
//!
//! A scheduler submits [`TaskHandle`]s to an [`ExecutionPool`]; the pool
//! keeps them waiting in priority order, runs at most `capacity` of them at
//! once through a [`ProcessRunner`](process::ProcessRunner), and propagates
//! cancellation into both queued entries and already-spawned processes.

pub mod api;
pub mod core;
pub mod pool;
pub mod process;
pub mod sink;
pub mod testing;

pub use crate::core::{ExecError, ExecutionId, JobId, TaskHandle, TaskId};
pub use crate::pool::{ExecutionPool, StartFn, StartFuture, TaskCompletion, TaskSummary};
pub use crate::process::{CommandRunner, ProcessRunner};
pub use crate::sink::{LogSink, NullSink, TracingSink};
