// src/exec/outcome.rs

//! Execution results and their classification.

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::time::Duration;

use serde::Serialize;
use tracing::{Level, debug, error, info, warn};

use crate::types;

/// What one job invocation produced. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub elapsed: Duration,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    /// Placeholder result for `--dry-run`: exit 0, zero duration.
    pub fn dry_run(command_line: &str) -> Self {
        Self {
            exit_code: types::SUCCESS,
            elapsed: Duration::ZERO,
            stdout: format!("[dry-run] would execute: {command_line}"),
            stderr: String::new(),
        }
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::classify(self.exit_code)
    }

    /// Exit status the supervisor terminates with for this result.
    ///
    /// The job's own code, except that both timeout representations are
    /// normalised to [`types::TIMEOUT`].
    pub fn final_exit_code(&self) -> i32 {
        match self.outcome() {
            Outcome::Timeout => types::TIMEOUT,
            _ => self.exit_code,
        }
    }
}

/// Classification of a job exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Exit code 1.
    Failure,
    /// Reserved timeout code or `timeout(1)`'s 124.
    Timeout,
    /// SIGINT-equivalent (130).
    Interrupted,
    /// SIGTERM-equivalent (143).
    Terminated,
    /// Any other nonzero code.
    Unclassified(i32),
}

impl Outcome {
    pub fn classify(code: i32) -> Self {
        match code {
            types::SUCCESS => Outcome::Success,
            types::GENERAL_ERROR => Outcome::Failure,
            types::TIMEOUT | types::PLATFORM_TIMEOUT => Outcome::Timeout,
            types::INTERRUPTED => Outcome::Interrupted,
            types::TERMINATED => Outcome::Terminated,
            other => Outcome::Unclassified(other),
        }
    }

    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }

    /// Level the captured stderr is logged at.
    pub fn stderr_level(self) -> Level {
        if self.is_success() {
            Level::DEBUG
        } else {
            Level::ERROR
        }
    }

    pub fn describe(self) -> String {
        match self {
            Outcome::Success => "completed successfully".to_string(),
            Outcome::Failure => "failed with a general error".to_string(),
            Outcome::Timeout => "timed out".to_string(),
            Outcome::Interrupted => "was interrupted".to_string(),
            Outcome::Terminated => "was terminated".to_string(),
            Outcome::Unclassified(code) => format!("failed with unexpected exit code {code}"),
        }
    }
}

/// Numeric exit code of a finished child.
///
/// A child killed by a signal reports `128 + signo`, matching shell
/// convention, so SIGINT/SIGTERM deaths classify as interrupted/terminated.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => 128 + status.signal().unwrap_or(0),
    }
}

/// Log the classification and the captured output.
///
/// Stdout always goes to DEBUG. Stderr goes to DEBUG on success and to
/// ERROR otherwise, one entry per line in original order.
pub fn report_outcome(result: &ExecutionResult) {
    let outcome = result.outcome();
    let elapsed_secs = result.elapsed.as_secs_f64();

    if outcome.is_success() {
        info!(exit_code = result.exit_code, elapsed_secs, "job {}", outcome.describe());
    } else if outcome == Outcome::Timeout {
        error!(
            exit_code = types::TIMEOUT,
            elapsed_secs,
            "job {}",
            outcome.describe()
        );
    } else if matches!(outcome, Outcome::Interrupted | Outcome::Terminated) {
        warn!(exit_code = result.exit_code, elapsed_secs, "job {}", outcome.describe());
    } else {
        error!(exit_code = result.exit_code, elapsed_secs, "job {}", outcome.describe());
    }

    for line in result.stdout.lines() {
        debug!(stream = "stdout", "{line}");
    }

    let level = outcome.stderr_level();
    for line in result.stderr.lines() {
        if level == Level::DEBUG {
            debug!(stream = "stderr", "{line}");
        } else {
            error!(stream = "stderr", "{line}");
        }
    }
}
