//! Cancellation integration tests.

use crate::common::{gated_start, handle, wait_for_pool};
use corral::testing::{RecordingSink, Script, ScriptedRunner, SinkLevel};
use corral::{ExecError, ExecutionPool, LogSink, StartFn, TaskId};
use std::sync::Arc;
use std::time::Duration;

/// Test: cancelling a waiting entry fails it immediately and removes it
/// from both snapshots.
#[tokio::test]
async fn test_cancel_waiting_entry() {
    let pool = ExecutionPool::new(1);

    let (blocker, _gate) = gated_start();
    pool.submit(handle("blocker", "true", 0, 0), blocker);

    let (start, _g) = gated_start();
    let victim = handle("victim", "true", 1, 0);
    let done = pool.submit(victim.clone(), start);

    pool.cancel(&victim);

    assert_eq!(done.await, Err(ExecError::Cancelled));
    assert!(pool
        .waiting_tasks()
        .iter()
        .all(|s| s.id != TaskId::new("victim")));
    assert!(pool
        .running_tasks()
        .iter()
        .all(|s| s.id != TaskId::new("victim")));
}

/// Test: §8 scenario — capacity 1, cancel the running task.
///
/// The token fires, the runner observes it, and the future fails with
/// `Cancelled` rather than an exit-code error.
#[tokio::test]
async fn test_cancel_running_task_through_runner() {
    let runner = Arc::new(ScriptedRunner::new().script("long-job", Script::BlockUntilCancelled));
    let pool = ExecutionPool::with_runner(1, runner.clone());
    let sink = Arc::new(RecordingSink::new());

    let task = handle("a", "long-job", 1, 0);
    let done = pool.submit_command(task.clone(), sink);

    wait_for_pool(&pool, |p| p.running_count() == 1).await;
    assert_eq!(runner.runs_started(), 1);

    pool.cancel(&task);

    assert_eq!(done.await, Err(ExecError::Cancelled));
    wait_for_pool(&pool, |p| p.running_count() == 0).await;
}

/// Test: cancelling a running entry frees its slot for the next waiter.
#[tokio::test]
async fn test_cancel_running_triggers_cascade() {
    let pool = ExecutionPool::new(1);

    let victim = handle("victim", "true", 1, 0);
    let victim_start: StartFn = Box::new(|token| {
        Box::pin(async move {
            token.cancelled().await;
            Err(ExecError::Cancelled)
        })
    });
    let done_victim = pool.submit(victim.clone(), victim_start);

    let next: StartFn = Box::new(|_token| Box::pin(async { Ok(()) }));
    let done_next = pool.submit(handle("next", "true", 2, 0), next);

    assert_eq!(pool.waiting_count(), 1);

    pool.cancel(&victim);

    assert_eq!(done_victim.await, Err(ExecError::Cancelled));
    assert_eq!(done_next.await, Ok(()));
}

/// Test: a task cancelled before its slot opens never starts its runner.
#[tokio::test]
async fn test_cancelled_waiting_task_never_starts() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .script("occupier", Script::SucceedAfter(Duration::from_millis(50)))
            .script("queued", Script::Succeed),
    );
    let pool = ExecutionPool::with_runner(1, runner.clone());

    let occupier = handle("occ", "occupier", 1, 0);
    let queued = handle("q", "queued", 2, 0);

    let done_occ = pool.submit_command(occupier, Arc::new(RecordingSink::new()));
    let sink_q = Arc::new(RecordingSink::new());
    let done_q = pool.submit_command(queued.clone(), Arc::clone(&sink_q) as Arc<dyn LogSink>);

    pool.cancel(&queued);
    assert_eq!(done_q.await, Err(ExecError::Cancelled));

    assert_eq!(done_occ.await, Ok(()));
    // Only the occupier ever reached the runner.
    assert_eq!(runner.runs_started(), 1);
    assert!(sink_q.contains(SinkLevel::Info, "waiting for a free execution slot"));
    assert!(!sink_q.contains(SinkLevel::Info, "running:"));
}
