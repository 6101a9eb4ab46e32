//! Testing utilities for users of the corral library.
//!
//! This module provides fakes for the crate's two seams:
//!
//! - [`RecordingSink`]: a [`LogSink`] that captures every message for
//!   assertions
//! - [`ScriptedRunner`]: a [`ProcessRunner`] whose runs resolve from a
//!   script instead of spawning real processes

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::ExecError;
use crate::process::ProcessRunner;
use crate::sink::LogSink;

/// Severity of a recorded sink message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkLevel {
    Debug,
    Info,
    Error,
}

/// A sink that records every message it receives.
///
/// # Example
///
/// ```ignore
/// let sink = Arc::new(RecordingSink::new());
/// runner.run("echo hi", sink.clone(), token).await?;
/// assert!(sink.lines_at(SinkLevel::Info).contains(&"hi".to_string()));
/// ```
#[derive(Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(SinkLevel, String)>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// All recorded messages, in arrival order.
    pub fn entries(&self) -> Vec<(SinkLevel, String)> {
        self.entries.lock().unwrap().clone()
    }

    /// Messages recorded at one level, in arrival order.
    pub fn lines_at(&self, level: SinkLevel) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// Whether any message at `level` contains `needle`.
    pub fn contains(&self, level: SinkLevel, needle: &str) -> bool {
        self.lines_at(level).iter().any(|line| line.contains(needle))
    }

    fn record(&self, level: SinkLevel, line: &str) {
        self.entries.lock().unwrap().push((level, line.to_string()));
    }
}

impl LogSink for RecordingSink {
    fn debug(&self, line: &str) {
        self.record(SinkLevel::Debug, line);
    }

    fn info(&self, line: &str) {
        self.record(SinkLevel::Info, line);
    }

    fn error(&self, line: &str) {
        self.record(SinkLevel::Error, line);
    }
}

/// Behavior of one scripted command.
#[derive(Debug, Clone)]
pub enum Script {
    /// Resolve `Ok(())` immediately.
    Succeed,
    /// Resolve `Ok(())` after a delay (cancellable during the delay).
    SucceedAfter(Duration),
    /// Resolve with `CommandFailed(code)`.
    FailWith(i32),
    /// Block until the cancellation token fires, then resolve `Cancelled`.
    BlockUntilCancelled,
}

/// A process runner that resolves runs from a script, without processes.
///
/// Commands without a script fail with `SpawnFailed`, mirroring a command
/// that could not be launched.
#[derive(Default)]
pub struct ScriptedRunner {
    scripts: Mutex<HashMap<String, Script>>,
    runs: AtomicUsize,
}

impl ScriptedRunner {
    /// Create a runner with no scripts.
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            runs: AtomicUsize::new(0),
        }
    }

    /// Register the behavior for one command string.
    pub fn script(self, command: impl Into<String>, script: Script) -> Self {
        self.scripts.lock().unwrap().insert(command.into(), script);
        self
    }

    /// How many runs have started.
    pub fn runs_started(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(
        &self,
        command: &str,
        sink: Arc<dyn LogSink>,
        token: CancellationToken,
    ) -> Result<(), ExecError> {
        if token.is_cancelled() {
            return Err(ExecError::Cancelled);
        }

        self.runs.fetch_add(1, Ordering::SeqCst);
        sink.info(&format!("running: {command}"));

        let script = self.scripts.lock().unwrap().get(command).cloned();
        match script {
            Some(Script::Succeed) => Ok(()),
            Some(Script::SucceedAfter(delay)) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => Ok(()),
                    _ = token.cancelled() => Err(ExecError::Cancelled),
                }
            }
            Some(Script::FailWith(code)) => Err(ExecError::CommandFailed(code)),
            Some(Script::BlockUntilCancelled) => {
                token.cancelled().await;
                Err(ExecError::Cancelled)
            }
            None => Err(ExecError::SpawnFailed(format!(
                "no script for command: {command}"
            ))),
        }
    }
}
