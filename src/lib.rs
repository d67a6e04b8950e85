// src/lib.rs

pub mod checks;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod lock;
pub mod logging;
pub mod orchestrator;
pub mod report;
pub mod signals;
pub mod types;

use tracing::{debug, error, warn};

use crate::cli::CliArgs;
use crate::config::{process_env, resolve};
use crate::exec::{Escalation, ExecutionSupervisor};
use crate::logging::init_logging;
use crate::orchestrator::Orchestrator;
use crate::signals::SignalCoordinator;

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - configuration resolution (flags, `BOP_*` environment, defaults)
/// - logging to the durable log file and stderr
/// - SIGINT/SIGTERM handling
/// - the orchestrated run with the real process executor
pub async fn run(args: CliArgs) -> i32 {
    let resolved = match resolve(&args, process_env) {
        Ok(resolved) => resolved,
        Err(err) => {
            eprintln!("bop-supervisor: {err}");
            return err.exit_code();
        }
    };

    if let Err(err) = init_logging(&resolved.paths, resolved.config.verbose) {
        eprintln!("bop-supervisor: {err}");
        return err.exit_code();
    }

    for warning in &resolved.warnings {
        warn!("{warning}");
    }
    debug!(config = ?resolved.config, paths = ?resolved.paths, "resolved configuration");

    let (_signals, shutdown) = match SignalCoordinator::install() {
        Ok(installed) => installed,
        Err(err) => {
            error!(error = %err, "failed to install signal handlers");
            return err.exit_code();
        }
    };

    let executor = ExecutionSupervisor::new(Escalation::default());
    Orchestrator::new(resolved.config, resolved.paths, executor, shutdown)
        .run()
        .await
}
