// src/exec/supervisor.rs

//! Runs the job as a child process under the execution ceiling.

use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout};
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::errors::Result;
use crate::exec::escalation::{Escalation, WaitOutcome, wait_with_deadline};
use crate::exec::outcome::{ExecutionResult, exit_code_of, report_outcome};
use crate::signals::ShutdownListener;
use crate::types;

/// How long to wait for the job's pipes to close once it has exited.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default)]
pub struct ExecutionSupervisor {
    escalation: Escalation,
}

impl ExecutionSupervisor {
    pub fn new(escalation: Escalation) -> Self {
        Self { escalation }
    }

    /// Run the job once.
    ///
    /// In dry-run mode nothing is spawned and a placeholder success is
    /// returned. Otherwise the job is started in its own process group with
    /// stdout and stderr captured separately, bounded by
    /// `config.max_duration`. The job is never retried.
    pub async fn run(
        &self,
        config: &RunConfig,
        shutdown: &ShutdownListener,
    ) -> Result<ExecutionResult> {
        if config.dry_run {
            info!(command = %config.command_line(), "dry run: job not started");
            let result = ExecutionResult::dry_run(&config.command_line());
            report_outcome(&result);
            return Ok(result);
        }

        info!(
            command = %config.command_line(),
            max_secs = config.max_duration.as_secs(),
            "starting job"
        );

        let started = Instant::now();
        let mut child = Command::new(&config.runtime)
            .args(config.job_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning job '{}'", config.command_line()))?;
        debug!(pid = child.id(), "job process started");

        let stdout = capture(child.stdout.take());
        let stderr = capture(child.stderr.take());

        let mut shutdown = shutdown.clone();
        let waited =
            wait_with_deadline(&mut child, config.max_duration, &self.escalation, &mut shutdown)
                .await?;
        let elapsed = started.elapsed();

        let exit_code = match waited {
            WaitOutcome::Exited(status) => exit_code_of(status),
            WaitOutcome::TimedOut { forced } => {
                debug!(forced, "timeout escalation finished");
                types::TIMEOUT
            }
            WaitOutcome::Cancelled { signal, forced } => {
                debug!(%signal, forced, "shutdown escalation finished");
                signal.exit_code()
            }
        };

        let result = ExecutionResult {
            exit_code,
            elapsed,
            stdout: drain(stdout, "stdout").await,
            stderr: drain(stderr, "stderr").await,
        };
        report_outcome(&result);
        Ok(result)
    }
}

fn capture<R>(stream: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            if let Err(e) = stream.read_to_end(&mut buf).await {
                debug!(error = %e, "job output stream closed with error");
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

async fn drain(mut handle: JoinHandle<String>, stream: &str) -> String {
    match timeout(OUTPUT_DRAIN_TIMEOUT, &mut handle).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!(stream, error = %e, "output capture task failed");
            String::new()
        }
        Err(_) => {
            // A grandchild outside the job's process group still holds the pipe.
            warn!(stream, "job output still open after exit; discarding");
            handle.abort();
            String::new()
        }
    }
}
