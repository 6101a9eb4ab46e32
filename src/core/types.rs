//! Core identifier types for the execution pool.
//!
//! These types provide type-safe identifiers for tasks and for the
//! scheduling coordinates (execution, job) that order them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a submitted task.
///
/// Opaque to the pool; the surrounding scheduler chooses the value. Ids must
/// be unique among tasks that are waiting or running at the same time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

/// Identifier of the scheduler execution a task belongs to.
///
/// Executions are numbered in scheduling order; a lower value means an older
/// execution, which is admitted first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExecutionId(u64);

/// Identifier of a job within an execution, used as the priority tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(u64);

impl TaskId {
    /// Create a new TaskId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl ExecutionId {
    /// Create a new ExecutionId from an ordinal.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying ordinal.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ExecutionId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl JobId {
    /// Create a new JobId from an ordinal.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying ordinal.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
