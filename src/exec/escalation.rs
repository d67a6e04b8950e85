// src/exec/escalation.rs

//! Bounded wait on the job with graceful-then-forceful termination.
//!
//! [`wait_with_deadline`] is the only place the supervisor suspends. It
//! returns when the first of these happens:
//! - the job exits on its own;
//! - the execution ceiling is reached: SIGTERM to the job's process group,
//!   wait the grace period, then SIGKILL if it is still alive;
//! - a shutdown signal arrives: same escalation, forwarded to the job.
//!
//! A heartbeat is logged at every poll interval while the job runs.

use std::process::ExitStatus;
use std::time::Duration;

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tokio::process::Child;
use tokio::time::{Instant, interval_at, sleep_until, timeout};
use tracing::{debug, info, warn};

use crate::signals::{ShutdownListener, ShutdownSignal};

const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Timing of liveness polling and of the termination escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Escalation {
    pub poll_interval: Duration,
    /// Time between SIGTERM and SIGKILL.
    pub grace_period: Duration,
}

impl Default for Escalation {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            grace_period: Duration::from_secs(5),
        }
    }
}

/// How the bounded wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Exited(ExitStatus),
    /// Ceiling reached. `forced` is true if SIGKILL was needed.
    TimedOut { forced: bool },
    Cancelled { signal: ShutdownSignal, forced: bool },
}

/// Wait for `child` for at most `ceiling`, escalating on timeout or shutdown.
pub async fn wait_with_deadline(
    child: &mut Child,
    ceiling: Duration,
    escalation: &Escalation,
    shutdown: &mut ShutdownListener,
) -> Result<WaitOutcome> {
    let started = Instant::now();
    // A ceiling past the timer's range means no deadline in practice.
    let deadline = started
        .checked_add(ceiling)
        .unwrap_or_else(|| started + FAR_FUTURE);
    let poll = escalation.poll_interval.max(Duration::from_millis(1));
    let mut heartbeat = interval_at(started + poll, poll);

    loop {
        tokio::select! {
            status = child.wait() => {
                let status = status.context("waiting for job process")?;
                return Ok(WaitOutcome::Exited(status));
            }
            _ = sleep_until(deadline) => {
                warn!(
                    ceiling_secs = ceiling.as_secs(),
                    "job exceeded maximum execution time; terminating"
                );
                let forced = terminate(child, escalation.grace_period).await?;
                return Ok(WaitOutcome::TimedOut { forced });
            }
            signal = shutdown.recv() => {
                warn!(%signal, "forwarding termination to job");
                let forced = terminate(child, escalation.grace_period).await?;
                return Ok(WaitOutcome::Cancelled { signal, forced });
            }
            _ = heartbeat.tick() => {
                debug!(
                    elapsed_secs = started.elapsed().as_secs(),
                    ceiling_secs = ceiling.as_secs(),
                    "job still running"
                );
            }
        }
    }
}

/// Two-stage termination: SIGTERM, wait `grace`, then SIGKILL.
///
/// Returns `true` if the job had to be force-killed.
pub async fn terminate(child: &mut Child, grace: Duration) -> Result<bool> {
    signal_job(child, Signal::SIGTERM);

    match timeout(grace, child.wait()).await {
        Ok(status) => {
            let status = status.context("waiting for job after SIGTERM")?;
            info!(?status, "job exited after graceful termination");
            Ok(false)
        }
        Err(_) => {
            warn!(
                grace_secs = grace.as_secs_f64(),
                "job still alive after grace period; sending SIGKILL"
            );
            signal_job(child, Signal::SIGKILL);
            if let Err(e) = child.start_kill() {
                debug!(error = %e, "direct kill after SIGKILL to group");
            }
            child.wait().await.context("waiting for job after SIGKILL")?;
            Ok(true)
        }
    }
}

/// Deliver `signal` to the job's process group (the job leads its own group).
fn signal_job(child: &Child, signal: Signal) {
    let Some(pid) = child.id() else {
        return;
    };
    match killpg(Pid::from_raw(pid as i32), signal) {
        Ok(()) => debug!(pid, ?signal, "signalled job process group"),
        Err(Errno::ESRCH) => debug!(pid, ?signal, "job process group already gone"),
        Err(e) => warn!(pid, ?signal, error = %e, "failed to signal job process group"),
    }
}
