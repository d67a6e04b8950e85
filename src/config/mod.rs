// src/config/mod.rs

//! Run configuration.
//!
//! - [`loader`] resolves a [`RunConfig`] from CLI flags, `BOP_*` environment
//!   variables and built-in defaults (in that order of precedence).
//! - [`validate`] performs the existence + parse check on the job's own
//!   JSON configuration file.

pub mod loader;
pub mod validate;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;

pub use loader::{Resolved, process_env, resolve};
pub use validate::check_job_config;

/// Default execution ceiling (one hour).
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(3600);
/// Default runtime interpreter for the job.
pub const DEFAULT_RUNTIME: &str = "python3";
/// Default job script name, relative to the base directory.
pub const DEFAULT_JOB_SCRIPT: &str = "bop_malaga_downloader.py";
/// Default reachability probe target.
pub const DEFAULT_NETWORK_PROBE: &str = "8.8.8.8:53";

/// Immutable settings for one supervised run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Job config file forwarded as `--config`, if any.
    pub config_path: Option<PathBuf>,
    pub verbose: bool,
    pub dry_run: bool,
    pub force: bool,
    /// Hard ceiling on the job's wall-clock time.
    pub max_duration: Duration,
    /// Bulletin date forwarded as `--date`, if any.
    pub date: Option<NaiveDate>,
    /// Interpreter used to launch the job (`python3` unless overridden).
    pub runtime: String,
    pub job_path: PathBuf,
    /// `host:port` for the reachability probe; `None` disables it.
    pub network_probe: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            verbose: false,
            dry_run: false,
            force: false,
            max_duration: DEFAULT_MAX_DURATION,
            date: None,
            runtime: DEFAULT_RUNTIME.to_string(),
            job_path: PathBuf::from(DEFAULT_JOB_SCRIPT),
            network_probe: Some(DEFAULT_NETWORK_PROBE.to_string()),
        }
    }
}

impl RunConfig {
    /// Arguments passed to the runtime: the job path followed by job flags.
    pub fn job_args(&self) -> Vec<String> {
        let mut args = vec![self.job_path.display().to_string()];
        if let Some(ref path) = self.config_path {
            args.push("--config".to_string());
            args.push(path.display().to_string());
        }
        if self.verbose {
            args.push("--verbose".to_string());
        }
        if let Some(date) = self.date {
            args.push("--date".to_string());
            args.push(date.format("%Y-%m-%d").to_string());
        }
        args
    }

    /// Human-readable command line, used in logs and dry-run output.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.runtime.clone()];
        parts.extend(self.job_args());
        parts.join(" ")
    }
}

/// On-disk locations owned by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorPaths {
    pub base_dir: PathBuf,
    pub lock_file: PathBuf,
    pub pid_file: PathBuf,
    pub log_dir: PathBuf,
    pub log_file: PathBuf,
}

impl SupervisorPaths {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let log_dir = base_dir.join("logs");
        Self {
            lock_file: base_dir.join("bop_malaga_downloader.lock"),
            pid_file: base_dir.join("bop_malaga_downloader.pid"),
            log_file: log_dir.join("cron_execution.log"),
            log_dir,
            base_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_args_follow_flag_order() {
        let cfg = RunConfig {
            config_path: Some(PathBuf::from("conf.json")),
            verbose: true,
            date: NaiveDate::from_ymd_opt(2025, 3, 1),
            job_path: PathBuf::from("/opt/bop/job.py"),
            ..RunConfig::default()
        };

        assert_eq!(
            cfg.job_args(),
            vec![
                "/opt/bop/job.py",
                "--config",
                "conf.json",
                "--verbose",
                "--date",
                "2025-03-01"
            ]
        );
        assert_eq!(
            cfg.command_line(),
            "python3 /opt/bop/job.py --config conf.json --verbose --date 2025-03-01"
        );
    }

    #[test]
    fn bare_job_has_no_flags() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.job_args(), vec![DEFAULT_JOB_SCRIPT.to_string()]);
    }

    #[test]
    fn paths_live_under_base_dir() {
        let paths = SupervisorPaths::new("/srv/bop");
        assert_eq!(paths.lock_file, PathBuf::from("/srv/bop/bop_malaga_downloader.lock"));
        assert_eq!(paths.pid_file, PathBuf::from("/srv/bop/bop_malaga_downloader.pid"));
        assert_eq!(paths.log_file, PathBuf::from("/srv/bop/logs/cron_execution.log"));
    }
}
