// src/checks/mod.rs

//! Pre-execution gates.
//!
//! - [`environment`] holds the hard preconditions (runtime, job, config).
//!   Each failure aborts the run with its own exit code.
//! - [`health`] holds the advisory probes (disk space, network) plus the one
//!   blocking probe: the log directory must be writable.

pub mod environment;
pub mod health;

pub use environment::EnvironmentValidator;
pub use health::{HealthProbe, HealthReport};
