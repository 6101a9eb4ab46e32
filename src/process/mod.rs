//! Process launching and lifecycle.
//!
//! [`ProcessRunner`] is the seam between the pool and the operating system;
//! [`CommandRunner`] is the production implementation on top of
//! `tokio::process`. It spawns the command through the platform shell,
//! streams output lines to the task's sink as they arrive, maps the exit
//! status, and kills the process with graceful-then-forceful escalation
//! when the cancellation token fires.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::ExecError;
use crate::sink::LogSink;

/// Default time a killed process gets to exit after SIGTERM.
const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(5);

/// The process-launch facility the pool drives for shell tasks.
///
/// Anything that can start a process for a command, stream its output to
/// the sink, observe its exit, and stop on cancellation satisfies this
/// contract. Tests substitute scripted implementations.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `command` to completion.
    ///
    /// Resolves `Ok(())` on exit code zero, `CommandFailed` on any other
    /// code, `SpawnFailed` if no exit status could be produced, and
    /// `Cancelled` if `token` fired and the process was terminated.
    async fn run(
        &self,
        command: &str,
        sink: Arc<dyn LogSink>,
        token: CancellationToken,
    ) -> Result<(), ExecError>;
}

/// Runs commands through the platform shell.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    kill_grace: Duration,
}

impl CommandRunner {
    /// Create a runner with the default kill grace period.
    pub fn new() -> Self {
        Self {
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    /// Set how long a cancelled process may linger after the graceful
    /// termination signal before it is killed forcefully.
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for CommandRunner {
    async fn run(
        &self,
        command: &str,
        sink: Arc<dyn LogSink>,
        token: CancellationToken,
    ) -> Result<(), ExecError> {
        if token.is_cancelled() {
            return Err(ExecError::Cancelled);
        }

        sink.info(&format!("running: {command}"));
        tracing::debug!(%command, "spawning process");

        let mut cmd = shell_command(command);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| ExecError::SpawnFailed(e.to_string()))?;

        // Piped above, so both takes succeed.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_reader = spawn_line_reader(stdout, Arc::clone(&sink), false);
        let err_reader = spawn_line_reader(stderr, Arc::clone(&sink), true);

        tokio::select! {
            status = child.wait() => {
                drain(out_reader, err_reader).await;
                let status = status
                    .map_err(|e| ExecError::SpawnFailed(format!("wait failed: {e}")))?;
                match status.code() {
                    Some(0) => Ok(()),
                    code => {
                        let code = code.unwrap_or(-1);
                        Err(ExecError::CommandFailed(code))
                    }
                }
            }
            _ = token.cancelled() => {
                tracing::debug!(%command, "cancellation requested, terminating process");
                terminate(&mut child, self.kill_grace).await;
                drain(out_reader, err_reader).await;
                Err(ExecError::Cancelled)
            }
        }
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Forward lines from a child pipe to the sink as they arrive.
fn spawn_line_reader(
    pipe: Option<impl AsyncRead + Unpin + Send + 'static>,
    sink: Arc<dyn LogSink>,
    is_stderr: bool,
) -> Option<JoinHandle<()>> {
    let pipe = pipe?;
    Some(tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if is_stderr {
                sink.error(&line);
            } else {
                sink.info(&line);
            }
        }
    }))
}

/// Collect the output tails before resolving the run.
async fn drain(out: Option<JoinHandle<()>>, err: Option<JoinHandle<()>>) {
    if let Some(task) = out {
        let _ = task.await;
    }
    if let Some(task) = err {
        let _ = task.await;
    }
}

/// Graceful-then-forceful termination.
///
/// On unix: SIGTERM, a bounded grace period, then a hard kill if the
/// process is still alive. Elsewhere only the hard kill applies.
async fn terminate(child: &mut Child, grace: Duration) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // SAFETY: plain signal delivery to a pid we own.
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        }
        if tokio::time::timeout(grace, child.wait()).await.is_ok() {
            return;
        }
        tracing::warn!(pid, "process ignored SIGTERM, killing forcefully");
    }
    #[cfg(not(unix))]
    let _ = grace;

    // kill() also reaps the child.
    let _ = child.kill().await;
}
