//! Process lifecycle integration tests.
//!
//! These drive real processes through the command runner, end to end.

#![cfg(unix)]

use crate::common::{handle, wait_for_pool};
use corral::testing::{RecordingSink, SinkLevel};
use corral::{CommandRunner, ExecError, ExecutionPool, LogSink, ProcessRunner};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Test: exit 0 resolves the completion future successfully.
#[tokio::test]
async fn test_successful_command() {
    let pool = ExecutionPool::new(1);
    let sink = Arc::new(RecordingSink::new());

    let done = pool.submit_command(
        handle("t", "true", 1, 0),
        Arc::clone(&sink) as Arc<dyn LogSink>,
    );

    assert_eq!(done.await, Ok(()));
}

/// Test: §8 scenario — `exit 1` fails with the exit code.
#[tokio::test]
async fn test_exit_one_carries_code() {
    let pool = ExecutionPool::new(1);

    let done = pool.submit_command(handle("t", "exit 1", 1, 0), Arc::new(RecordingSink::new()));

    assert_eq!(done.await, Err(ExecError::CommandFailed(1)));
}

/// Test: sink sees the waiting diagnostic, the running diagnostic, and the
/// streamed output lines, in that order.
#[tokio::test]
async fn test_sink_diagnostics_and_output_ordered() {
    let pool = ExecutionPool::new(1);
    let sink = Arc::new(RecordingSink::new());

    let done = pool.submit_command(
        handle("t", "echo one; echo two >&2", 1, 0),
        Arc::clone(&sink) as Arc<dyn LogSink>,
    );
    done.await.unwrap();

    let info = sink.lines_at(SinkLevel::Info);
    assert!(info[0].starts_with("waiting for a free execution slot"));
    assert!(info[1].starts_with("running:"));
    assert!(info.contains(&"one".to_string()));
    assert!(sink.lines_at(SinkLevel::Error).contains(&"two".to_string()));
}

/// Test: cancelling a running `sleep` kills the process promptly.
#[tokio::test]
async fn test_cancel_kills_real_process() {
    let runner = Arc::new(CommandRunner::new().with_kill_grace(Duration::from_millis(500)));
    let pool = ExecutionPool::with_runner(1, runner);

    let task = handle("sleeper", "sleep 30", 1, 0);
    let done = pool.submit_command(task.clone(), Arc::new(RecordingSink::new()));

    wait_for_pool(&pool, |p| p.running_count() == 1).await;
    // Give the shell a moment to exec.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let start = Instant::now();
    pool.cancel(&task);

    assert_eq!(done.await, Err(ExecError::Cancelled));
    assert!(
        start.elapsed() < Duration::from_secs(5),
        "kill took too long: {:?}",
        start.elapsed()
    );
    wait_for_pool(&pool, |p| p.running_count() == 0).await;
}

/// Test: the runner used directly distinguishes signal death from an exit
/// code and maps unknown codes to -1.
#[tokio::test]
async fn test_runner_direct_signal_death_maps_to_minus_one() {
    let runner = CommandRunner::new();
    let sink = Arc::new(RecordingSink::new());

    // The shell kills itself; no exit code is produced.
    let result = runner
        .run("kill -9 $$", sink, CancellationToken::new())
        .await;

    assert_eq!(result, Err(ExecError::CommandFailed(-1)));
}

/// Test: mixed outcomes across a drained pool surface independently.
#[tokio::test]
async fn test_mixed_outcomes_drain() {
    let pool = ExecutionPool::new(2);

    let ok = pool.submit_command(handle("ok", "true", 1, 0), Arc::new(RecordingSink::new()));
    let bad = pool.submit_command(
        handle("bad", "exit 3", 1, 1),
        Arc::new(RecordingSink::new()),
    );
    let echo = pool.submit_command(
        handle("echo", "echo done", 1, 2),
        Arc::new(RecordingSink::new()),
    );

    assert_eq!(ok.await, Ok(()));
    assert_eq!(bad.await, Err(ExecError::CommandFailed(3)));
    assert_eq!(echo.await, Ok(()));

    assert_eq!(pool.running_count(), 0);
    assert_eq!(pool.waiting_count(), 0);
}
