//! Per-task logging sinks.
//!
//! Every submitted command carries a [`LogSink`] that receives diagnostic
//! messages and the streamed output of its process. Sinks are provided by
//! the caller per task; [`TracingSink`] bridges to the `tracing` pipeline
//! and [`NullSink`] discards everything.

use crate::core::TaskId;

/// Fire-and-forget logging sink for one task.
///
/// Implementations must not block the caller: stdout/stderr reader tasks and
/// the pool itself call these methods inline.
pub trait LogSink: Send + Sync {
    /// Low-level diagnostic message.
    fn debug(&self, line: &str);

    /// Informational message, including streamed stdout lines.
    fn info(&self, line: &str);

    /// Error message, including streamed stderr lines.
    fn error(&self, line: &str);
}

/// Sink that forwards to `tracing` with the task id as a structured field.
pub struct TracingSink {
    task_id: TaskId,
}

impl TracingSink {
    /// Create a sink tagged with the given task id.
    pub fn new(task_id: TaskId) -> Self {
        Self { task_id }
    }
}

impl LogSink for TracingSink {
    fn debug(&self, line: &str) {
        tracing::debug!(task = %self.task_id, "{}", line);
    }

    fn info(&self, line: &str) {
        tracing::info!(task = %self.task_id, "{}", line);
    }

    fn error(&self, line: &str) {
        tracing::error!(task = %self.task_id, "{}", line);
    }
}

/// Sink that discards all messages.
pub struct NullSink;

impl LogSink for NullSink {
    fn debug(&self, _line: &str) {}
    fn info(&self, _line: &str) {}
    fn error(&self, _line: &str) {}
}
