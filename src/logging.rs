// src/logging.rs

//! Logging setup for `bop-supervisor` using `tracing` + `tracing-subscriber`.
//!
//! Two sinks are installed:
//! 1. the durable log file (append-only), which always receives DEBUG and up;
//! 2. STDERR, which receives INFO and up, or DEBUG and up with `--verbose`.
//!
//! WARN and ERROR therefore always reach both sinks.

use std::fs::{self, OpenOptions};
use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

use crate::config::SupervisorPaths;
use crate::errors::{Result, SupervisorError};

/// Initialise the global logging subscriber.
///
/// Creates the log directory if needed. Failing to create it, or to open the
/// log file, is fatal: a run that cannot record its outcome must not start.
///
/// Safe to call once at startup.
pub fn init_logging(paths: &SupervisorPaths, verbose: bool) -> Result<()> {
    fs::create_dir_all(&paths.log_dir).map_err(|e| SupervisorError::LogDirUnwritable {
        path: paths.log_dir.clone(),
        reason: format!("cannot create directory: {e}"),
    })?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_file)
        .map_err(|e| SupervisorError::LogDirUnwritable {
            path: paths.log_dir.clone(),
            reason: format!("cannot open {}: {e}", paths.log_file.display()),
        })?;

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(Arc::new(file))
        .with_filter(LevelFilter::DEBUG);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(console_level(verbose));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| SupervisorError::Other(anyhow::anyhow!("installing log subscriber: {e}")))?;

    Ok(())
}

/// Most verbose level echoed to the interactive channel.
pub fn console_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}
