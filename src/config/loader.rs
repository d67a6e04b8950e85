// src/config/loader.rs

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;

use crate::cli::CliArgs;
use crate::config::{
    DEFAULT_JOB_SCRIPT, DEFAULT_MAX_DURATION, DEFAULT_NETWORK_PROBE, DEFAULT_RUNTIME, RunConfig,
    SupervisorPaths,
};
use crate::errors::{Result, SupervisorError};

pub const ENV_CONFIG_FILE: &str = "BOP_CONFIG_FILE";
pub const ENV_MAX_EXECUTION_TIME: &str = "BOP_MAX_EXECUTION_TIME";
pub const ENV_VERBOSE: &str = "BOP_VERBOSE";
pub const ENV_HOME: &str = "BOP_HOME";
pub const ENV_PYTHON: &str = "BOP_PYTHON";
pub const ENV_JOB_SCRIPT: &str = "BOP_JOB_SCRIPT";
pub const ENV_NETWORK_PROBE: &str = "BOP_NETWORK_PROBE";

/// Upper bound accepted for the execution ceiling (one week).
pub const MAX_EXECUTION_SECS: u64 = 7 * 24 * 60 * 60;

/// Output of [`resolve`].
///
/// `warnings` collects invalid environment values that were ignored; they
/// are logged once the logging subscriber is installed.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub config: RunConfig,
    pub paths: SupervisorPaths,
    pub warnings: Vec<String>,
}

/// Environment lookup backed by the real process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Resolve the run configuration.
///
/// Precedence per setting: CLI flag, then `BOP_*` environment variable, then
/// built-in default. Empty environment values count as unset.
///
/// Only a malformed `--date` is an error; bad environment values fall back
/// to defaults with a warning.
pub fn resolve(args: &CliArgs, env: impl Fn(&str) -> Option<String>) -> Result<Resolved> {
    let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());
    let mut warnings = Vec::new();

    let base_dir = lookup(ENV_HOME)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let paths = SupervisorPaths::new(&base_dir);

    let config_path = args
        .config
        .clone()
        .or_else(|| lookup(ENV_CONFIG_FILE).map(PathBuf::from));

    let verbose = args.verbose
        || match lookup(ENV_VERBOSE) {
            Some(raw) => parse_bool(&raw),
            None => false,
        };

    let max_duration = match lookup(ENV_MAX_EXECUTION_TIME) {
        Some(raw) => match parse_seconds(&raw) {
            Some(d) => d,
            None => {
                warnings.push(format!(
                    "invalid {ENV_MAX_EXECUTION_TIME}={raw:?} (expected 1..={MAX_EXECUTION_SECS} seconds); using {}s",
                    DEFAULT_MAX_DURATION.as_secs()
                ));
                DEFAULT_MAX_DURATION
            }
        },
        None => DEFAULT_MAX_DURATION,
    };

    let date = match args.date {
        Some(ref raw) => Some(parse_date(raw).map_err(SupervisorError::Other)?),
        None => None,
    };

    let runtime = lookup(ENV_PYTHON).unwrap_or_else(|| DEFAULT_RUNTIME.to_string());
    let job_path = lookup(ENV_JOB_SCRIPT)
        .map(PathBuf::from)
        .unwrap_or_else(|| base_dir.join(DEFAULT_JOB_SCRIPT));

    let network_probe = match lookup(ENV_NETWORK_PROBE) {
        Some(raw) if raw.trim().eq_ignore_ascii_case("off") => None,
        Some(raw) => Some(raw.trim().to_string()),
        None => Some(DEFAULT_NETWORK_PROBE.to_string()),
    };

    let config = RunConfig {
        config_path,
        verbose,
        dry_run: args.dry_run,
        force: args.force,
        max_duration,
        date,
        runtime,
        job_path,
        network_probe,
    };

    Ok(Resolved {
        config,
        paths,
        warnings,
    })
}

/// Boolean environment values: `true`, `1`, `yes`, `on` (any case) are true.
pub fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn parse_seconds(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if (1..=MAX_EXECUTION_SECS).contains(&secs) => Some(Duration::from_secs(secs)),
        _ => None,
    }
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid --date {raw:?}: expected YYYY-MM-DD"))
}
