// src/orchestrator.rs

//! Sequences one supervised run.
//!
//! Stages, each a hard gate on the next:
//! lock → environment validation → health probes → job → summary.
//!
//! The lock guard lives for the whole of [`Orchestrator::run_stages`], so it
//! is released on every way out of it: success, any stage error, or a
//! shutdown observed at a stage boundary. The one exception is a lock held
//! by another live instance, which is never touched.

use chrono::Local;
use tracing::{error, info, warn};

use crate::checks::{EnvironmentValidator, HealthProbe};
use crate::config::{RunConfig, SupervisorPaths};
use crate::errors::{Result, SupervisorError};
use crate::exec::JobExecutor;
use crate::lock::LockManager;
use crate::report::SummaryReport;
use crate::signals::ShutdownListener;

pub struct Orchestrator<E: JobExecutor> {
    config: RunConfig,
    paths: SupervisorPaths,
    executor: E,
    shutdown: ShutdownListener,
}

impl<E: JobExecutor> Orchestrator<E> {
    pub fn new(
        config: RunConfig,
        paths: SupervisorPaths,
        executor: E,
        shutdown: ShutdownListener,
    ) -> Self {
        Self {
            config,
            paths,
            executor,
            shutdown,
        }
    }

    /// Run all stages and return the process exit code.
    ///
    /// That is the job's own exit code, unless an earlier stage assigned a
    /// reserved supervisor code or the job timed out.
    pub async fn run(mut self) -> i32 {
        info!(
            pid = std::process::id(),
            dry_run = self.config.dry_run,
            force = self.config.force,
            "supervisor starting"
        );

        match self.run_stages().await {
            Ok(code) => {
                info!(exit_code = code, "supervisor finished");
                code
            }
            Err(err) => {
                let code = err.exit_code();
                match err {
                    SupervisorError::Cancelled(signal) => {
                        warn!(%signal, exit_code = code, "run cancelled; lock released");
                    }
                    SupervisorError::LockHeld { pid } => {
                        error!(
                            pid,
                            exit_code = code,
                            "another instance is already running; exiting"
                        );
                    }
                    other => {
                        error!(error = %other, exit_code = code, "run aborted");
                    }
                }
                code
            }
        }
    }

    async fn run_stages(&mut self) -> Result<i32> {
        let _lock = LockManager::new(&self.paths).acquire(self.config.force)?;
        self.checkpoint()?;

        EnvironmentValidator::new(&self.config).validate()?;
        self.checkpoint()?;

        HealthProbe::new(&self.paths, self.config.network_probe.as_deref())
            .run()
            .await?;
        self.checkpoint()?;

        let started_at = Local::now();
        let result = self.executor.execute(&self.config, &self.shutdown).await?;
        self.checkpoint()?;

        SummaryReport::new(&result, &self.config, started_at).emit();
        Ok(result.final_exit_code())
    }

    /// Stop at a stage boundary if a shutdown was requested.
    fn checkpoint(&self) -> Result<()> {
        match self.shutdown.current() {
            Some(signal) => Err(SupervisorError::Cancelled(signal)),
            None => Ok(()),
        }
    }
}
