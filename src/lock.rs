// src/lock.rs

//! Single-instance lock.
//!
//! The lock is advisory: a lock file holding the supervisor's PID plus a
//! mirror PID file. A record whose PID no longer names a live process is
//! stale and gets cleared. There is no OS-level file locking, so two
//! supervisors racing between the staleness check and creation are only
//! separated by `create_new`.
//!
//! Acquisition hands back a [`LockGuard`]; dropping it releases the lock,
//! so every exit path of the run (errors, cancellation, panics) cleans up.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tracing::{debug, info, warn};

use crate::config::SupervisorPaths;
use crate::errors::{Result, SupervisorError};

/// On-disk lock record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRecord {
    pub pid: u32,
    pub path: PathBuf,
}

impl LockRecord {
    /// Read the record at `path`.
    ///
    /// `Ok(None)` if there is no lock file. A lock file whose content is not
    /// a PID yields `pid == 0`, which is never considered alive.
    pub fn read(path: &Path) -> io::Result<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(Self {
                pid: contents.trim().parse().unwrap_or(0),
                path: path.to_path_buf(),
            })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn is_stale(&self) -> bool {
        !is_process_alive(self.pid)
    }
}

/// Signal-0 existence probe.
///
/// `EPERM` means the process exists but belongs to someone else.
pub fn is_process_alive(pid: u32) -> bool {
    if pid == 0 || pid > i32::MAX as u32 {
        return false;
    }
    match kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Owns the lock file and PID marker for one supervisor instance.
#[derive(Debug, Clone)]
pub struct LockManager {
    lock_file: PathBuf,
    pid_file: PathBuf,
}

impl LockManager {
    pub fn new(paths: &SupervisorPaths) -> Self {
        Self {
            lock_file: paths.lock_file.clone(),
            pid_file: paths.pid_file.clone(),
        }
    }

    /// Take the lock for the current process.
    ///
    /// - No record: proceed.
    /// - Record and `force`: proceed without looking at it.
    /// - Record naming a live process: [`SupervisorError::LockHeld`]; the
    ///   record is left untouched.
    /// - Stale record: warn, remove it, proceed.
    pub fn acquire(&self, force: bool) -> Result<LockGuard> {
        if let Some(existing) = LockRecord::read(&self.lock_file)? {
            if force {
                warn!(
                    pid = existing.pid,
                    lock = %self.lock_file.display(),
                    "--force given; overriding existing lock"
                );
                remove_if_present(&self.lock_file)?;
            } else if !existing.is_stale() {
                return Err(SupervisorError::LockHeld { pid: existing.pid });
            } else {
                warn!(
                    pid = existing.pid,
                    lock = %self.lock_file.display(),
                    "removing stale lock left by a process that is no longer running"
                );
                remove_if_present(&self.lock_file)?;
            }
        }

        let pid = std::process::id();
        self.create_record(pid)?;
        info!(pid, lock = %self.lock_file.display(), "lock acquired");

        Ok(LockGuard {
            manager: self.clone(),
            record: LockRecord {
                pid,
                path: self.lock_file.clone(),
            },
            released: false,
        })
    }

    fn create_record(&self, pid: u32) -> Result<()> {
        if let Some(parent) = self.lock_file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating lock directory {}", parent.display()))?;
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_file)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                // Another instance won the race after our staleness check.
                let holder = LockRecord::read(&self.lock_file)?.map_or(0, |r| r.pid);
                return Err(SupervisorError::LockHeld { pid: holder });
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("creating lock file {}", self.lock_file.display()))
                    .into());
            }
        };
        let written = writeln!(file, "{pid}")
            .with_context(|| format!("writing lock file {}", self.lock_file.display()))
            .and_then(|()| {
                fs::write(&self.pid_file, format!("{pid}\n"))
                    .with_context(|| format!("writing pid file {}", self.pid_file.display()))
            });

        // No guard exists yet, so a half-written record must be undone here.
        if let Err(e) = written {
            drop(file);
            if let Err(cleanup) = self.release() {
                warn!(error = %cleanup, "failed to remove partial lock record");
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Remove the lock and PID files. Absent files are not an error.
    pub fn release(&self) -> Result<()> {
        remove_if_present(&self.lock_file)?;
        remove_if_present(&self.pid_file)?;
        debug!(lock = %self.lock_file.display(), "lock released");
        Ok(())
    }
}

/// Held lock. Released on drop.
#[derive(Debug)]
pub struct LockGuard {
    manager: LockManager,
    record: LockRecord,
    released: bool,
}

impl LockGuard {
    pub fn record(&self) -> &LockRecord {
        &self.record
    }

    /// Release now instead of at drop. Idempotent.
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.manager.release()
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "failed to release lock");
        }
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
