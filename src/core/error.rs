//! Task execution error types.

use thiserror::Error;

/// Errors that can surface through a submitted task's completion future.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// The task was cancelled before or during execution.
    #[error("task cancelled")]
    Cancelled,

    /// The process ran to completion with a nonzero exit code.
    #[error("command exited with code {0}")]
    CommandFailed(i32),

    /// The start path failed before the process produced an exit status.
    #[error("failed to start task: {0}")]
    SpawnFailed(String),
}

impl ExecError {
    /// Check whether this failure is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecError::Cancelled)
    }

    /// The exit code, if the process produced one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::CommandFailed(code) => Some(*code),
            _ => None,
        }
    }
}
