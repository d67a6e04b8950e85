// src/types.rs

//! Reserved supervisor exit codes.
//!
//! These are the statuses the supervisor itself may terminate with. Any other
//! value returned by `bop-supervisor` is the job's own exit code passed
//! through unchanged.

/// Job (or dry-run) completed successfully.
pub const SUCCESS: i32 = 0;
/// General error: job failed, bad CLI usage, or an unexpected supervisor error.
pub const GENERAL_ERROR: i32 = 1;
/// Another live supervisor holds the lock.
pub const LOCK_HELD: i32 = 2;
/// Runtime interpreter missing, or the log directory is unusable.
pub const ENVIRONMENT_MISSING: i32 = 3;
/// Job executable missing.
pub const EXECUTABLE_MISSING: i32 = 4;
/// Job exceeded the execution ceiling.
pub const TIMEOUT: i32 = 5;
/// Job configuration missing or malformed.
pub const CONFIG_INVALID: i32 = 6;
/// Exit status used by `timeout(1)`; classified the same as [`TIMEOUT`].
pub const PLATFORM_TIMEOUT: i32 = 124;
/// SIGINT (128 + 2).
pub const INTERRUPTED: i32 = 130;
/// SIGTERM (128 + 15).
pub const TERMINATED: i32 = 143;
