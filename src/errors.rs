// src/errors.rs

//! Crate-wide error type and helpers.
//!
//! Every variant corresponds to one failure category of a supervised run and
//! maps onto a fixed exit code via [`SupervisorError::exit_code`].

use std::path::PathBuf;

use thiserror::Error;

use crate::signals::ShutdownSignal;
use crate::types;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("another instance is already running (pid {pid})")]
    LockHeld { pid: u32 },

    #[error("runtime not found: {0}")]
    RuntimeMissing(String),

    #[error("job executable not found: {}", .0.display())]
    ExecutableMissing(PathBuf),

    #[error("log directory {} is not writable: {reason}", .path.display())]
    LogDirUnwritable { path: PathBuf, reason: String },

    #[error("configuration file not found: {}", .0.display())]
    ConfigMissing(PathBuf),

    #[error("configuration file {} is invalid: {reason}", .path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("run cancelled by {0}")]
    Cancelled(ShutdownSignal),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SupervisorError {
    /// Reserved exit code the supervisor terminates with for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SupervisorError::LockHeld { .. } => types::LOCK_HELD,
            SupervisorError::RuntimeMissing(_) | SupervisorError::LogDirUnwritable { .. } => {
                types::ENVIRONMENT_MISSING
            }
            SupervisorError::ExecutableMissing(_) => types::EXECUTABLE_MISSING,
            SupervisorError::ConfigMissing(_) | SupervisorError::ConfigInvalid { .. } => {
                types::CONFIG_INVALID
            }
            SupervisorError::Cancelled(signal) => signal.exit_code(),
            SupervisorError::Io(_) | SupervisorError::Other(_) => types::GENERAL_ERROR,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SupervisorError>;
