//! Common test utilities shared across integration tests.

use corral::{ExecError, ExecutionId, ExecutionPool, JobId, StartFn, TaskHandle};
use std::time::Duration;
use tokio::sync::oneshot;

/// Build a handle for `command` at the given scheduling coordinates.
pub fn handle(id: &str, command: &str, execution: u64, job: u64) -> TaskHandle {
    TaskHandle::new(id, command, ExecutionId::new(execution), JobId::new(job))
}

/// A start callback that blocks until the returned sender releases it.
///
/// Dropping the sender resolves the task with `Cancelled`.
pub fn gated_start() -> (StartFn, oneshot::Sender<Result<(), ExecError>>) {
    let (tx, rx) = oneshot::channel();
    let start: StartFn = Box::new(move |_token| {
        Box::pin(async move { rx.await.unwrap_or(Err(ExecError::Cancelled)) })
    });
    (start, tx)
}

/// Wait for a pool condition to hold, polling the snapshots.
///
/// More reliable than fixed sleeps since watcher scheduling can vary.
/// Polls every 5ms and panics after the timeout.
pub async fn wait_for_pool(pool: &ExecutionPool, mut cond: impl FnMut(&ExecutionPool) -> bool) {
    let timeout = Duration::from_secs(3);
    let start = tokio::time::Instant::now();
    while !cond(pool) {
        if start.elapsed() > timeout {
            panic!(
                "Timeout waiting for pool condition; running={} waiting={}",
                pool.running_count(),
                pool.waiting_count()
            );
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
