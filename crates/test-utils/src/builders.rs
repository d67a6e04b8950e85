#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bop_supervisor::config::{RunConfig, SupervisorPaths};
use tempfile::TempDir;

/// A throwaway base directory holding the lock, PID and log files, plus a
/// shell-script job run with `sh` as the runtime.
pub struct Sandbox {
    dir: TempDir,
    pub paths: SupervisorPaths,
    pub job: PathBuf,
}

impl Sandbox {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path to a file inside the sandbox.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a file into the sandbox and return its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.file(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// A `RunConfig` that runs the sandbox job with `sh`, with no network
    /// probe and a generous ceiling.
    pub fn config(&self) -> RunConfig {
        RunConfig {
            runtime: "sh".to_string(),
            job_path: self.job.clone(),
            max_duration: Duration::from_secs(30),
            network_probe: None,
            ..RunConfig::default()
        }
    }

    pub fn lock_exists(&self) -> bool {
        self.paths.lock_file.exists()
    }
}

/// Builder for [`Sandbox`].
pub struct SandboxBuilder {
    script: String,
    executable: bool,
    with_job: bool,
}

impl SandboxBuilder {
    pub fn new() -> Self {
        Self {
            script: "exit 0\n".to_string(),
            executable: true,
            with_job: true,
        }
    }

    /// Body of the job script (interpreted by `sh`).
    pub fn job_script(mut self, script: &str) -> Self {
        self.script = script.to_string();
        self
    }

    /// Leave the job script without execute permission.
    pub fn not_executable(mut self) -> Self {
        self.executable = false;
        self
    }

    /// Don't create the job script at all.
    pub fn without_job(mut self) -> Self {
        self.with_job = false;
        self
    }

    pub fn build(self) -> Sandbox {
        let dir = tempfile::tempdir().unwrap();
        let paths = SupervisorPaths::new(dir.path());
        let job = dir.path().join("job.sh");

        if self.with_job {
            fs::write(&job, &self.script).unwrap();
            let mode = if self.executable { 0o755 } else { 0o644 };
            fs::set_permissions(&job, fs::Permissions::from_mode(mode)).unwrap();
        }

        Sandbox { dir, paths, job }
    }
}

impl Default for SandboxBuilder {
    fn default() -> Self {
        Self::new()
    }
}
