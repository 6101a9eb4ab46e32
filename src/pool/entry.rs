//! Queue entry types owned by the execution pool.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::Serialize;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::core::{ExecError, ExecutionId, TaskHandle, TaskId};

/// Future produced by a start callback.
pub type StartFuture = Pin<Box<dyn Future<Output = Result<(), ExecError>> + Send>>;

/// Start callback supplied at submission time.
///
/// Invoked once when the task is admitted, with the cancellation token the
/// pool fires if the task is cancelled while running.
pub type StartFn = Box<dyn FnOnce(CancellationToken) -> StartFuture + Send>;

/// An entry in the waiting queue.
///
/// Owns the start callback and the completion sender until the entry is
/// either promoted to running or cancelled.
pub(crate) struct WaitingEntry {
    pub handle: TaskHandle,
    pub start: StartFn,
    pub done: oneshot::Sender<Result<(), ExecError>>,
    pub token: CancellationToken,
}

/// An entry in the running set.
///
/// The start callback and completion sender have moved into the watcher
/// task; what remains is what `cancel` and the monitoring view need.
pub(crate) struct RunningEntry {
    pub handle: TaskHandle,
    pub token: CancellationToken,
}

/// Future returned by [`ExecutionPool::submit`](crate::pool::ExecutionPool::submit).
///
/// Resolves when the task completes, fails, or is cancelled. Dropping the
/// pool with the entry still live resolves this with
/// [`ExecError::Cancelled`].
pub struct TaskCompletion {
    rx: oneshot::Receiver<Result<(), ExecError>>,
}

impl TaskCompletion {
    pub(crate) fn new(rx: oneshot::Receiver<Result<(), ExecError>>) -> Self {
        Self { rx }
    }
}

impl Future for TaskCompletion {
    type Output = Result<(), ExecError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // Sender dropped without a result: the pool went away.
            Poll::Ready(Err(_)) => Poll::Ready(Err(ExecError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Point-in-time summary of one waiting or running task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub command: String,
    pub execution: ExecutionId,
}

impl From<&TaskHandle> for TaskSummary {
    fn from(handle: &TaskHandle) -> Self {
        Self {
            id: handle.id().clone(),
            command: handle.command().to_string(),
            execution: handle.execution(),
        }
    }
}
