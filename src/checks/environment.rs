// src/checks/environment.rs

use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{RunConfig, check_job_config};
use crate::errors::{Result, SupervisorError};

/// Sequential one-shot precondition checks.
#[derive(Debug)]
pub struct EnvironmentValidator<'a> {
    config: &'a RunConfig,
}

impl<'a> EnvironmentValidator<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    /// Runtime present, then job present, then config (if any) parses.
    pub fn validate(&self) -> Result<()> {
        let runtime = self.check_runtime()?;
        debug!(runtime = %runtime.display(), "runtime found");

        self.check_job()?;

        if let Some(ref path) = self.config.config_path {
            let sections = check_job_config(path)?;
            debug!(
                config = %path.display(),
                sections = sections.len(),
                "job configuration parsed"
            );
        }

        info!("environment validation passed");
        Ok(())
    }

    fn check_runtime(&self) -> Result<PathBuf> {
        find_program(&self.config.runtime)
            .ok_or_else(|| SupervisorError::RuntimeMissing(self.config.runtime.clone()))
    }

    fn check_job(&self) -> Result<()> {
        let job = &self.config.job_path;
        if !job.is_file() {
            return Err(SupervisorError::ExecutableMissing(job.clone()));
        }

        if !is_executable(job) {
            // Not fatal: the job is launched through the runtime anyway.
            match mark_executable(job) {
                Ok(()) => info!(job = %job.display(), "job was not executable; marked it executable"),
                Err(e) => warn!(job = %job.display(), error = %e, "could not mark job executable"),
            }
        }
        Ok(())
    }
}

/// Resolve `program` the way a shell would: paths are checked directly,
/// bare names are searched for on `PATH`.
pub fn find_program(program: &str) -> Option<PathBuf> {
    if program.contains('/') {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }

    let search = env::var_os("PATH")?;
    env::split_paths(&search)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

fn mark_executable(path: &Path) -> std::io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)
}
