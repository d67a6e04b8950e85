use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bop_supervisor::config::{RunConfig, SupervisorPaths};
use bop_supervisor::errors::Result;
use bop_supervisor::exec::{ExecutionResult, JobExecutor};
use bop_supervisor::signals::ShutdownListener;

/// A fake executor that:
/// - records each invocation, and whether the lock file existed at the time
/// - returns a canned result without spawning anything.
pub struct FakeExecutor {
    result: ExecutionResult,
    lock_file: std::path::PathBuf,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub config: RunConfig,
    pub lock_held: bool,
}

impl FakeExecutor {
    pub fn new(paths: &SupervisorPaths, exit_code: i32) -> Self {
        Self {
            result: ExecutionResult {
                exit_code,
                elapsed: Duration::from_millis(10),
                stdout: String::new(),
                stderr: String::new(),
            },
            lock_file: paths.lock_file.clone(),
            invocations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the recorded invocations.
    pub fn invocations(&self) -> Arc<Mutex<Vec<Invocation>>> {
        Arc::clone(&self.invocations)
    }
}

impl JobExecutor for FakeExecutor {
    fn execute<'a>(
        &'a mut self,
        config: &'a RunConfig,
        _shutdown: &'a ShutdownListener,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionResult>> + Send + 'a>> {
        let invocations = Arc::clone(&self.invocations);
        let lock_held = self.lock_file.exists();
        let result = self.result.clone();

        Box::pin(async move {
            invocations.lock().unwrap().push(Invocation {
                config: config.clone(),
                lock_held,
            });
            Ok(result)
        })
    }
}
