// src/exec/backend.rs

//! Pluggable job executor abstraction.
//!
//! The orchestrator talks to a `JobExecutor` instead of spawning processes
//! itself. Production uses [`ExecutionSupervisor`]; tests can swap in a fake
//! that records invocations and returns canned results.

use std::future::Future;
use std::pin::Pin;

use crate::config::RunConfig;
use crate::errors::Result;
use crate::exec::outcome::ExecutionResult;
use crate::exec::supervisor::ExecutionSupervisor;
use crate::signals::ShutdownListener;

/// Trait abstracting how the job is executed.
pub trait JobExecutor: Send {
    /// Run the job once and produce its result.
    ///
    /// Implementations must observe `shutdown` while the job runs.
    fn execute<'a>(
        &'a mut self,
        config: &'a RunConfig,
        shutdown: &'a ShutdownListener,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionResult>> + Send + 'a>>;
}

impl JobExecutor for ExecutionSupervisor {
    fn execute<'a>(
        &'a mut self,
        config: &'a RunConfig,
        shutdown: &'a ShutdownListener,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionResult>> + Send + 'a>> {
        Box::pin(self.run(config, shutdown))
    }
}
