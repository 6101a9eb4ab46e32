//! Task handle: the immutable descriptor of one runnable unit.

use serde::{Deserialize, Serialize};

use super::types::{ExecutionId, JobId, TaskId};

/// Descriptor of one schedulable unit of work.
///
/// A handle carries everything the pool needs to queue and identify a task:
/// the unique task id, the shell command to run, and the scheduling
/// coordinates that order it against other waiting tasks. Immutable once
/// created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    id: TaskId,
    command: String,
    execution: ExecutionId,
    job: JobId,
}

impl TaskHandle {
    /// Create a handle for a command at the given scheduling coordinates.
    pub fn new(
        id: impl Into<TaskId>,
        command: impl Into<String>,
        execution: ExecutionId,
        job: JobId,
    ) -> Self {
        Self {
            id: id.into(),
            command: command.into(),
            execution,
            job,
        }
    }

    /// The unique task id.
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    /// The shell command this task runs.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The execution this task belongs to.
    pub fn execution(&self) -> ExecutionId {
        self.execution
    }

    /// The job ordinal within the execution.
    pub fn job(&self) -> JobId {
        self.job
    }

    /// The waiting-queue ordering key for this handle.
    pub(crate) fn order_key(&self) -> OrderKey {
        OrderKey {
            execution: self.execution,
            job: self.job,
            id: self.id.clone(),
        }
    }
}

/// Ordering key for the waiting queue.
///
/// The priority pair `(execution, job)` decides admission order, lowest
/// first. The task id extends the pair into a strict total order so two
/// entries with equal priority never collide in the ordered collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct OrderKey {
    execution: ExecutionId,
    job: JobId,
    id: TaskId,
}
