// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Flags left unset here fall back to `BOP_*` environment variables and then
//! to built-in defaults; see [`crate::config`].

use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for `bop-supervisor`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "bop-supervisor",
    version,
    about = "Run the BOP Málaga PDF downloader once, under a lock and a timeout.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the downloader's JSON configuration file.
    ///
    /// Default: `BOP_CONFIG_FILE`, otherwise none (the job uses its own defaults).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Echo DEBUG entries to the terminal and pass `--verbose` to the job.
    #[arg(short, long)]
    pub verbose: bool,

    /// Validate and probe, but don't start the job.
    #[arg(long)]
    pub dry_run: bool,

    /// Take the lock even if another instance appears to hold it.
    #[arg(long)]
    pub force: bool,

    /// Download the bulletin for a specific date (YYYY-MM-DD), forwarded to the job.
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,
}

/// Parse process arguments without exiting on error.
///
/// `clap` exits with status 2 on usage errors, which collides with the
/// "lock held" code, so the caller decides how to exit.
pub fn try_parse() -> Result<CliArgs, clap::Error> {
    CliArgs::try_parse()
}
