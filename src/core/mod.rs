//! Core domain types for the execution pool.
//!
//! Identifiers, the task handle submitted by callers, and the error type
//! surfaced through completion futures.

mod error;
mod handle;
mod types;

pub use error::ExecError;
pub use handle::TaskHandle;
pub use types::{ExecutionId, JobId, TaskId};

pub(crate) use handle::OrderKey;
