// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`supervisor`] spawns the job with `tokio::process::Command` and
//!   captures its output.
//! - [`escalation`] is the bounded wait with graceful-then-forceful
//!   termination.
//! - [`outcome`] defines [`ExecutionResult`] and classifies exit codes.
//! - [`backend`] provides the [`JobExecutor`] trait the orchestrator uses,
//!   which tests can replace with a fake implementation.

pub mod backend;
pub mod escalation;
pub mod outcome;
pub mod supervisor;

pub use backend::JobExecutor;
pub use escalation::{Escalation, WaitOutcome, wait_with_deadline};
pub use outcome::{ExecutionResult, Outcome};
pub use supervisor::ExecutionSupervisor;
