//! The admission-control engine.
//!
//! [`ExecutionPool`] holds the waiting queue and the running set behind one
//! mutex and moves entries between them atomically. It owns no scheduler
//! task: admission decisions run synchronously inside whichever caller's
//! control flow frees or fills a slot, and watcher tasks exist only to await
//! each running entry's future.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::core::{ExecError, OrderKey, TaskHandle, TaskId};
use crate::process::{CommandRunner, ProcessRunner};
use crate::sink::LogSink;

use super::entry::{RunningEntry, StartFn, TaskCompletion, TaskSummary, WaitingEntry};

/// Both pool collections, guarded jointly.
///
/// `admit_next` observes and mutates both, so they live under one lock.
struct PoolState {
    waiting: BTreeMap<OrderKey, WaitingEntry>,
    running: HashMap<TaskId, RunningEntry>,
}

impl PoolState {
    fn is_live(&self, id: &TaskId) -> bool {
        self.running.contains_key(id)
            || self.waiting.values().any(|entry| entry.handle.id() == id)
    }
}

struct PoolInner {
    capacity: usize,
    runner: Arc<dyn ProcessRunner>,
    state: Mutex<PoolState>,
}

/// Capacity-bounded execution pool for local shell tasks.
///
/// Cheap to clone; all clones share one state. Submitted tasks wait in
/// priority order (oldest execution first, job ordinal as tie-break) until
/// a running slot frees up, at which point the lowest-keyed entry is
/// admitted. The running set never exceeds the configured capacity.
///
/// # Example
///
/// ```ignore
/// let pool = ExecutionPool::new(4);
/// let handle = TaskHandle::new("1/0", "echo hi", ExecutionId::new(1), JobId::new(0));
/// let completion = pool.submit_command(handle, Arc::new(NullSink));
/// completion.await?;
/// ```
#[derive(Clone)]
pub struct ExecutionPool {
    inner: Arc<PoolInner>,
}

impl ExecutionPool {
    /// Create a pool that admits at most `capacity` concurrent tasks,
    /// running commands through the default [`CommandRunner`].
    ///
    /// A capacity of zero is allowed and admits nothing.
    pub fn new(capacity: usize) -> Self {
        Self::with_runner(capacity, Arc::new(CommandRunner::new()))
    }

    /// Create a pool with a custom process-launch facility.
    pub fn with_runner(capacity: usize, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                capacity,
                runner,
                state: Mutex::new(PoolState {
                    waiting: BTreeMap::new(),
                    running: HashMap::new(),
                }),
            }),
        }
    }

    /// The configured concurrency ceiling.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Number of currently running tasks.
    pub fn running_count(&self) -> usize {
        self.lock_state().running.len()
    }

    /// Number of tasks waiting for a slot.
    pub fn waiting_count(&self) -> usize {
        self.lock_state().waiting.len()
    }

    /// Submit a task with an explicit start callback.
    ///
    /// The entry joins the waiting queue and is admitted as soon as a slot
    /// and its priority allow; `start` is then invoked with the pool-issued
    /// cancellation token. The returned future resolves with the callback's
    /// eventual result, or with [`ExecError::Cancelled`] if the task is
    /// cancelled first.
    ///
    /// Ids must be unique among live tasks: a handle whose id is already
    /// waiting or running is rejected with [`ExecError::SpawnFailed`] and
    /// pool state is untouched.
    pub fn submit(&self, handle: TaskHandle, start: StartFn) -> TaskCompletion {
        let (done, rx) = oneshot::channel();
        let token = CancellationToken::new();

        {
            let mut state = self.lock_state();
            if state.is_live(handle.id()) {
                tracing::warn!(task = %handle.id(), "rejected submission with duplicate live id");
                let _ = done.send(Err(ExecError::SpawnFailed(format!(
                    "task id {} is already waiting or running",
                    handle.id()
                ))));
                return TaskCompletion::new(rx);
            }

            tracing::debug!(
                task = %handle.id(),
                execution = %handle.execution(),
                job = %handle.job(),
                "task queued"
            );
            state.waiting.insert(
                handle.order_key(),
                WaitingEntry {
                    handle,
                    start,
                    done,
                    token,
                },
            );
        }

        self.admit_ready();
        TaskCompletion::new(rx)
    }

    /// Submit a shell command, wiring the pool's configured process runner.
    ///
    /// Emits the waiting-for-a-slot diagnostic to the sink at enqueue time;
    /// the runner emits the running diagnostic just before launch.
    pub fn submit_command(&self, handle: TaskHandle, sink: Arc<dyn LogSink>) -> TaskCompletion {
        sink.info(&format!(
            "waiting for a free execution slot to run: {}",
            handle.command()
        ));

        let runner = Arc::clone(&self.inner.runner);
        let command = handle.command().to_string();
        let start: StartFn = Box::new(move |token| {
            Box::pin(async move { runner.run(&command, sink, token).await })
        });

        self.submit(handle, start)
    }

    /// Cancel a task.
    ///
    /// A waiting entry is removed atomically and its future fails with
    /// [`ExecError::Cancelled`] immediately. A running entry stays in the
    /// running set; its cancellation token fires so the process runner kills
    /// the process, and removal follows through the normal completion path.
    /// Unknown handles are a no-op.
    pub fn cancel(&self, handle: &TaskHandle) {
        let removed = {
            let mut state = self.lock_state();
            if let Some(entry) = state.waiting.remove(&handle.order_key()) {
                Some(entry)
            } else {
                if let Some(running) = state.running.get(handle.id()) {
                    tracing::debug!(task = %handle.id(), "cancelling running task");
                    running.token.cancel();
                }
                None
            }
        };

        if let Some(entry) = removed {
            tracing::debug!(task = %entry.handle.id(), "cancelled while waiting");
            let _ = entry.done.send(Err(ExecError::Cancelled));
        }
    }

    /// Read-only snapshot of the running set.
    pub fn running_tasks(&self) -> Vec<TaskSummary> {
        self.lock_state()
            .running
            .values()
            .map(|entry| TaskSummary::from(&entry.handle))
            .collect()
    }

    /// Read-only snapshot of the waiting queue, in admission order.
    pub fn waiting_tasks(&self) -> Vec<TaskSummary> {
        self.lock_state()
            .waiting
            .values()
            .map(|entry| TaskSummary::from(&entry.handle))
            .collect()
    }

    /// Promote waiting entries while capacity allows.
    ///
    /// Each iteration is one indivisible check-and-move: observe occupancy,
    /// pop the lowest order key, insert it into the running set. The start
    /// callback runs outside the critical section, in a spawned watcher. An
    /// explicit loop rather than recursion so long cascades cannot grow the
    /// stack.
    fn admit_ready(&self) {
        loop {
            let promoted = {
                let mut state = self.lock_state();
                if state.running.len() >= self.inner.capacity {
                    None
                } else if let Some((_, entry)) = state.waiting.pop_first() {
                    state.running.insert(
                        entry.handle.id().clone(),
                        RunningEntry {
                            handle: entry.handle.clone(),
                            token: entry.token.clone(),
                        },
                    );
                    Some(entry)
                } else {
                    None
                }
            };

            let Some(entry) = promoted else {
                break;
            };

            tracing::debug!(
                task = %entry.handle.id(),
                execution = %entry.handle.execution(),
                job = %entry.handle.job(),
                "task admitted"
            );
            self.spawn_watcher(entry);
        }
    }

    /// Drive one admitted entry to completion and report back.
    ///
    /// The start callback is evaluated inside a nested spawned task so a
    /// panicking callback surfaces as that entry's failure instead of
    /// killing the watcher or corrupting pool state.
    fn spawn_watcher(&self, entry: WaitingEntry) {
        let pool = self.clone();
        let WaitingEntry {
            handle,
            start,
            done,
            token,
        } = entry;

        tokio::spawn(async move {
            let guarded = tokio::spawn(async move { start(token).await });
            let result = match guarded.await {
                Ok(result) => result,
                Err(join_err) if join_err.is_panic() => Err(ExecError::SpawnFailed(format!(
                    "start callback panicked: {join_err}"
                ))),
                Err(_) => Err(ExecError::Cancelled),
            };

            pool.finish(handle.id(), done, result);
        });
    }

    /// Remove a finished entry from the running set and re-run admission.
    fn finish(
        &self,
        id: &TaskId,
        done: oneshot::Sender<Result<(), ExecError>>,
        result: Result<(), ExecError>,
    ) {
        {
            let mut state = self.lock_state();
            if state.running.remove(id).is_none() {
                debug_assert!(false, "finished task {id} missing from running set");
                tracing::error!(task = %id, "finished task missing from running set");
            }
        }

        match &result {
            Ok(()) => tracing::info!(task = %id, "task completed"),
            Err(err) => tracing::info!(task = %id, error = %err, "task failed"),
        }

        let _ = done.send(result);
        self.admit_ready();
    }

    /// State transitions are plain collection moves, so a panic in a lock
    /// holder cannot leave the data inconsistent. Recover from poisoning
    /// instead of propagating it.
    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
