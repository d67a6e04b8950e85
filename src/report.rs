// src/report.rs

//! End-of-run summary.

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::RunConfig;
use crate::exec::ExecutionResult;

const DELIMITER: &str = "============================================================";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed-field report of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub script: PathBuf,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub duration_secs: f64,
    pub exit_code: i32,
    pub pid: u32,
    pub config_path: Option<PathBuf>,
    pub date: Option<NaiveDate>,
    pub dry_run: bool,
    pub verbose: bool,
}

impl SummaryReport {
    /// Build the report for the job's run window: `started_at` is when the
    /// job was launched, so the end time is `started_at` plus the elapsed
    /// duration measured by the supervisor.
    pub fn new(result: &ExecutionResult, config: &RunConfig, started_at: DateTime<Local>) -> Self {
        let finished_at = started_at
            + chrono::Duration::from_std(result.elapsed).unwrap_or(chrono::Duration::zero());
        Self {
            script: config.job_path.clone(),
            started_at,
            finished_at,
            duration_secs: result.elapsed.as_secs_f64(),
            exit_code: result.final_exit_code(),
            pid: std::process::id(),
            config_path: config.config_path.clone(),
            date: config.date,
            dry_run: config.dry_run,
            verbose: config.verbose,
        }
    }

    /// Report body, without the delimiter frame.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            "EXECUTION SUMMARY".to_string(),
            format!("Script: {}", self.script.display()),
            format!("Start time: {}", self.started_at.format(TIMESTAMP_FORMAT)),
            format!("End time: {}", self.finished_at.format(TIMESTAMP_FORMAT)),
            format!("Duration: {:.1}s", self.duration_secs),
            format!("Exit code: {}", self.exit_code),
            format!("PID: {}", self.pid),
        ];
        if let Some(ref path) = self.config_path {
            lines.push(format!("Config file: {}", path.display()));
        }
        if let Some(date) = self.date {
            lines.push(format!("Date: {}", date.format("%Y-%m-%d")));
        }
        if self.dry_run {
            lines.push("Mode: DRY RUN".to_string());
        }
        if self.verbose {
            lines.push("Verbose: enabled".to_string());
        }
        lines
    }

    /// Write the report as INFO entries framed by delimiter lines.
    pub fn emit(&self) {
        info!("{DELIMITER}");
        for line in self.lines() {
            info!("{line}");
        }
        info!("{DELIMITER}");

        match serde_json::to_string(self) {
            Ok(json) => debug!(summary = %json, "summary as json"),
            Err(e) => debug!(error = %e, "could not serialise summary"),
        }
    }
}
