// tests/binary.rs

//! Drives the compiled `bop-supervisor` binary end to end.

mod common;
use crate::common::LiveProcess;
use crate::common::builders::{Sandbox, SandboxBuilder};

use std::error::Error;
use std::fs;
use std::process::{Command, Output, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

type TestResult = Result<(), Box<dyn Error>>;

fn supervisor(sandbox: &Sandbox) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bop-supervisor"));
    cmd.env("BOP_HOME", sandbox.root())
        .env("BOP_PYTHON", "sh")
        .env("BOP_JOB_SCRIPT", &sandbox.job)
        .env("BOP_NETWORK_PROBE", "off")
        .env_remove("BOP_CONFIG_FILE")
        .env_remove("BOP_MAX_EXECUTION_TIME")
        .env_remove("BOP_VERBOSE");
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("failed to run bop-supervisor")
}

#[test]
fn unknown_flag_fails_with_usage() -> TestResult {
    let sandbox = SandboxBuilder::new().build();
    let out = run(supervisor(&sandbox).arg("--bogus"));

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Usage"), "{stderr}");
    Ok(())
}

#[test]
fn help_exits_zero() -> TestResult {
    let sandbox = SandboxBuilder::new().build();
    let out = run(supervisor(&sandbox).arg("--help"));

    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("--dry-run"));
    assert!(stdout.contains("--force"));
    Ok(())
}

#[test]
fn successful_run_writes_summary_to_log_file() -> TestResult {
    let sandbox = SandboxBuilder::new()
        .job_script("echo 'job stderr chatter' >&2\nexit 0\n")
        .build();
    let out = run(&mut supervisor(&sandbox));

    assert_eq!(out.status.code(), Some(0));
    assert!(!sandbox.lock_exists());

    let log = fs::read_to_string(&sandbox.paths.log_file)?;
    assert!(log.contains("EXECUTION SUMMARY"));
    assert!(log.contains("Exit code: 0"));
    // Durable log always carries DEBUG entries.
    assert!(log.contains("DEBUG"));
    assert!(log.contains("job stderr chatter"));

    // Not verbose: DEBUG is not echoed to the terminal.
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(!stderr.contains("job stderr chatter"), "{stderr}");
    Ok(())
}

#[test]
fn verbose_env_echoes_debug() -> TestResult {
    let sandbox = SandboxBuilder::new()
        .job_script("echo 'job stderr chatter' >&2\nexit 0\n")
        .build();
    let out = run(supervisor(&sandbox).env("BOP_VERBOSE", "true"));

    assert_eq!(out.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("job stderr chatter"), "{stderr}");
    Ok(())
}

#[test]
fn job_failure_code_is_the_process_exit_code() -> TestResult {
    let sandbox = SandboxBuilder::new().job_script("exit 1\n").build();
    let out = run(&mut supervisor(&sandbox));

    assert_eq!(out.status.code(), Some(1));
    assert!(!sandbox.lock_exists());
    Ok(())
}

#[test]
fn invalid_config_exits_six() -> TestResult {
    let sandbox = SandboxBuilder::new().build();
    let marker = sandbox.file("ran");
    sandbox.write("job.sh", &format!("touch '{}'\n", marker.display()));
    let config = sandbox.write("config.json", "not json at all");

    let out = run(supervisor(&sandbox).arg("--config").arg(&config));

    assert_eq!(out.status.code(), Some(6));
    assert!(!marker.exists());
    assert!(!sandbox.lock_exists());
    Ok(())
}

#[test]
fn lock_held_by_live_process_exits_two() -> TestResult {
    let sandbox = SandboxBuilder::new().build();
    let holder = LiveProcess::spawn();
    fs::write(&sandbox.paths.lock_file, format!("{}\n", holder.pid()))?;

    let out = run(&mut supervisor(&sandbox));

    assert_eq!(out.status.code(), Some(2));
    assert!(sandbox.lock_exists());
    Ok(())
}

#[test]
fn dry_run_exits_zero() -> TestResult {
    let sandbox = SandboxBuilder::new().job_script("exit 3\n").build();
    let out = run(supervisor(&sandbox).arg("--dry-run"));

    assert_eq!(out.status.code(), Some(0));
    let log = fs::read_to_string(&sandbox.paths.log_file)?;
    assert!(log.contains("Mode: DRY RUN"));
    Ok(())
}

#[test]
fn timeout_from_env_exits_five() -> TestResult {
    let sandbox = SandboxBuilder::new().job_script("sleep 30\n").build();
    let started = Instant::now();
    let out = run(supervisor(&sandbox).env("BOP_MAX_EXECUTION_TIME", "1"));

    assert_eq!(out.status.code(), Some(5));
    assert!(started.elapsed() < Duration::from_secs(15));
    assert!(!sandbox.lock_exists());
    Ok(())
}

#[test]
fn sigterm_releases_lock_and_exits_143() -> TestResult {
    let sandbox = SandboxBuilder::new().job_script("sleep 30\n").build();
    let mut child = supervisor(&sandbox)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    // The lock only appears once the signal handlers are installed.
    let deadline = Instant::now() + Duration::from_secs(10);
    while !sandbox.lock_exists() {
        assert!(Instant::now() < deadline, "supervisor never took the lock");
        sleep(Duration::from_millis(20));
    }
    sleep(Duration::from_millis(300));

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM)?;
    let status = child.wait()?;

    assert_eq!(status.code(), Some(143));
    assert!(!sandbox.lock_exists());
    assert!(!sandbox.paths.pid_file.exists());
    Ok(())
}
