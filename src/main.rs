//! corral - a bounded-concurrency runner for shell commands.
//!
//! Usage:
//!   corral run <commands-file>    Run every command in the file through the pool

use clap::{Parser, Subcommand};
use corral::api::{start_server, ApiConfig, ApiState};
use corral::{ExecError, ExecutionPool, ExecutionId, JobId, TaskHandle, TracingSink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// corral - run shell commands through a bounded-concurrency pool
#[derive(Parser)]
#[command(name = "corral")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every command from a file (one per line)
    Run {
        /// Path to the file listing shell commands, one per line
        #[arg(value_name = "COMMANDS_FILE")]
        commands_file: PathBuf,

        /// Maximum concurrently running commands
        #[arg(short = 'c', long, default_value = "4")]
        capacity: usize,

        /// Host for the monitoring API
        #[arg(long, default_value = "127.0.0.1")]
        api_host: String,

        /// Port for the monitoring API
        #[arg(long, default_value = "8641")]
        api_port: u16,

        /// Disable the monitoring API
        #[arg(long)]
        no_api: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            commands_file,
            capacity,
            api_host,
            api_port,
            no_api,
        } => {
            run_commands(commands_file, capacity, api_host, api_port, no_api).await?;
        }
    }

    Ok(())
}

/// Run every command from the file through one pool and report the outcome.
async fn run_commands(
    commands_file: PathBuf,
    capacity: usize,
    api_host: String,
    api_port: u16,
    no_api: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Loading commands from: {}", commands_file.display());

    let contents = std::fs::read_to_string(&commands_file)?;
    let commands: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    if commands.is_empty() {
        warn!("No commands found in {}", commands_file.display());
        return Ok(());
    }

    info!(
        "Running {} command(s) with capacity {}",
        commands.len(),
        capacity
    );

    let pool = ExecutionPool::new(capacity);

    let api_server = if no_api {
        None
    } else {
        let config = ApiConfig::new(api_host, api_port);
        let state = ApiState { pool: pool.clone() };
        Some(start_server(config, state).await?)
    };

    // All commands belong to one execution; the line number is the job
    // ordinal, so file order is admission order.
    let execution = ExecutionId::new(1);
    let mut handles = Vec::new();
    let mut completions = Vec::new();
    for (index, command) in commands.into_iter().enumerate() {
        let job = JobId::new(index as u64);
        let handle = TaskHandle::new(format!("1/{index}"), command, execution, job);
        let sink = Arc::new(TracingSink::new(handle.id().clone()));
        completions.push((handle.clone(), pool.submit_command(handle.clone(), sink)));
        handles.push(handle);
    }

    let mut drain = tokio::spawn(async move {
        let mut failed = 0usize;
        let mut cancelled = 0usize;
        for (handle, completion) in completions {
            match completion.await {
                Ok(()) => {}
                Err(ExecError::Cancelled) => {
                    cancelled += 1;
                    warn!("Task '{}' cancelled", handle.id());
                }
                Err(err) => {
                    failed += 1;
                    error!("Task '{}' failed: {}", handle.id(), err);
                }
            }
        }
        (failed, cancelled)
    });

    info!("Press Ctrl+C to cancel");

    let (failed, cancelled) = tokio::select! {
        result = &mut drain => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("\nCancelling all tasks...");
            for handle in &handles {
                pool.cancel(handle);
            }
            drain.await?
        }
    };

    if let Some(server) = api_server {
        server.abort();
    }

    let total = handles.len();
    info!(
        "Done: {} succeeded, {} failed, {} cancelled",
        total - failed - cancelled,
        failed,
        cancelled
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
