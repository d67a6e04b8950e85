// tests/execution.rs

mod common;
use crate::common::builders::SandboxBuilder;
use crate::common::{LogCapture, with_timeout};

use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use bop_supervisor::config::RunConfig;
use bop_supervisor::exec::{Escalation, ExecutionSupervisor, Outcome};
use bop_supervisor::signals::{ShutdownSignal, shutdown_channel};

type TestResult = Result<(), Box<dyn Error>>;

fn fast_escalation() -> Escalation {
    Escalation {
        poll_interval: Duration::from_millis(100),
        grace_period: Duration::from_millis(500),
    }
}

#[tokio::test]
async fn dry_run_never_spawns_the_job() -> TestResult {
    let sandbox = SandboxBuilder::new().build();
    let marker = sandbox.file("ran");
    let job = sandbox.write("job.sh", &format!("touch '{}'\n", marker.display()));

    let config = RunConfig {
        dry_run: true,
        job_path: job,
        ..sandbox.config()
    };
    let (_trigger, shutdown) = shutdown_channel();

    let result = ExecutionSupervisor::new(fast_escalation())
        .run(&config, &shutdown)
        .await?;

    assert_eq!(result.exit_code, 0);
    assert_eq!(result.elapsed, Duration::ZERO);
    assert!(result.stdout.contains("dry-run"));
    assert!(!marker.exists(), "dry run must not start the job");
    Ok(())
}

#[tokio::test]
async fn stderr_of_successful_job_is_debug_only() -> TestResult {
    let sandbox = SandboxBuilder::new()
        .job_script("echo 'fetched 3 edictos'\necho 'deprecation notice' >&2\nexit 0\n")
        .build();
    let (_trigger, shutdown) = shutdown_channel();

    let capture = LogCapture::new();
    let _logs = capture.install();
    let result = ExecutionSupervisor::new(fast_escalation())
        .run(&sandbox.config(), &shutdown)
        .await?;

    assert_eq!(result.outcome(), Outcome::Success);
    assert_eq!(result.stdout.trim(), "fetched 3 edictos");
    assert_eq!(result.stderr.trim(), "deprecation notice");
    assert_eq!(capture.matching("DEBUG", "deprecation notice").len(), 1);
    assert!(capture.matching("ERROR", "deprecation notice").is_empty());
    Ok(())
}

#[tokio::test]
async fn failing_job_stderr_is_logged_line_by_line_at_error() -> TestResult {
    let sandbox = SandboxBuilder::new()
        .job_script("echo 'first problem' >&2\necho 'second problem' >&2\necho 'third problem' >&2\nexit 1\n")
        .build();
    let (_trigger, shutdown) = shutdown_channel();

    let capture = LogCapture::new();
    let _logs = capture.install();
    let result = ExecutionSupervisor::new(fast_escalation())
        .run(&sandbox.config(), &shutdown)
        .await?;

    assert_eq!(result.exit_code, 1);
    assert_eq!(result.outcome(), Outcome::Failure);
    assert_eq!(result.final_exit_code(), 1);

    let errors = capture.matching("ERROR", "problem");
    assert_eq!(errors.len(), 3);
    assert!(errors[0].contains("first problem"));
    assert!(errors[1].contains("second problem"));
    assert!(errors[2].contains("third problem"));
    Ok(())
}

#[tokio::test]
async fn blank_stderr_lines_are_kept_in_order() -> TestResult {
    let sandbox = SandboxBuilder::new()
        .job_script("echo 'traceback start' >&2\necho '' >&2\necho 'traceback end' >&2\nexit 1\n")
        .build();
    let (_trigger, shutdown) = shutdown_channel();

    let capture = LogCapture::new();
    let _logs = capture.install();
    ExecutionSupervisor::new(fast_escalation())
        .run(&sandbox.config(), &shutdown)
        .await?;

    let errors = capture.matching("ERROR", "stream=\"stderr\"");
    assert_eq!(errors.len(), 3);
    assert!(errors[0].contains("traceback start"));
    assert!(!errors[1].contains("traceback"));
    assert!(errors[2].contains("traceback end"));
    Ok(())
}

#[tokio::test]
async fn job_receives_config_and_verbose_flags() -> TestResult {
    let sandbox = SandboxBuilder::new().job_script("echo \"$@\"\n").build();
    let config = RunConfig {
        config_path: Some(PathBuf::from("/etc/bop/config.json")),
        verbose: true,
        ..sandbox.config()
    };
    let (_trigger, shutdown) = shutdown_channel();

    let result = ExecutionSupervisor::new(fast_escalation())
        .run(&config, &shutdown)
        .await?;

    assert_eq!(result.stdout.trim(), "--config /etc/bop/config.json --verbose");
    Ok(())
}

#[tokio::test]
async fn unclassified_exit_code_is_passed_through() -> TestResult {
    let sandbox = SandboxBuilder::new().job_script("exit 42\n").build();
    let (_trigger, shutdown) = shutdown_channel();

    let result = ExecutionSupervisor::new(fast_escalation())
        .run(&sandbox.config(), &shutdown)
        .await?;

    assert_eq!(result.outcome(), Outcome::Unclassified(42));
    assert_eq!(result.final_exit_code(), 42);
    Ok(())
}

#[tokio::test]
async fn timeout_escalates_to_kill_for_a_job_ignoring_sigterm() -> TestResult {
    // Ignores SIGTERM well past the grace period; only SIGKILL stops it.
    let sandbox = SandboxBuilder::new()
        .job_script("trap '' TERM\necho started\nsleep 30\n")
        .build();
    let config = RunConfig {
        max_duration: Duration::from_secs(1),
        ..sandbox.config()
    };
    let (_trigger, shutdown) = shutdown_channel();

    let capture = LogCapture::new();
    let _logs = capture.install();
    let started = Instant::now();
    let result = with_timeout(ExecutionSupervisor::new(fast_escalation()).run(&config, &shutdown))
        .await?;
    let took = started.elapsed();

    assert_eq!(result.exit_code, 5);
    assert_eq!(result.outcome(), Outcome::Timeout);
    assert!(took >= Duration::from_millis(1500), "took {took:?}");
    assert!(took < Duration::from_secs(10), "took {took:?}");
    assert!(result.stdout.contains("started"));

    let lines = capture.lines();
    let term_at = lines
        .iter()
        .position(|l| l.contains("exceeded maximum execution time"))
        .expect("graceful termination logged");
    let kill_at = lines
        .iter()
        .position(|l| l.contains("sending SIGKILL"))
        .expect("force kill logged");
    assert!(term_at < kill_at);
    Ok(())
}

#[tokio::test]
async fn timeout_with_cooperative_job_stops_at_sigterm() -> TestResult {
    let sandbox = SandboxBuilder::new()
        .job_script("trap 'echo got TERM >&2; exit 0' TERM\nsleep 30 &\nwait $!\n")
        .build();
    let config = RunConfig {
        max_duration: Duration::from_secs(1),
        ..sandbox.config()
    };
    let (_trigger, shutdown) = shutdown_channel();

    let capture = LogCapture::new();
    let _logs = capture.install();
    let result = with_timeout(ExecutionSupervisor::new(fast_escalation()).run(&config, &shutdown))
        .await?;

    // Exit code is normalised even though the job itself exited 0.
    assert_eq!(result.exit_code, 5);
    assert!(result.stderr.contains("got TERM"));
    assert!(capture.matching("WARN", "sending SIGKILL").is_empty());
    Ok(())
}

#[tokio::test]
async fn shutdown_signal_is_forwarded_to_running_job() -> TestResult {
    let sandbox = SandboxBuilder::new().job_script("sleep 30\n").build();
    let (trigger, shutdown) = shutdown_channel();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.fire(ShutdownSignal::Terminate);
    });

    let started = Instant::now();
    let result = with_timeout(
        ExecutionSupervisor::new(fast_escalation()).run(&sandbox.config(), &shutdown),
    )
    .await?;

    assert_eq!(result.exit_code, 143);
    assert_eq!(result.outcome(), Outcome::Terminated);
    assert!(started.elapsed() < Duration::from_secs(10));
    Ok(())
}
