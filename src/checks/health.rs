// src/checks/health.rs

use std::fs;
use std::path::Path;
use std::time::Duration;

use nix::sys::statvfs::statvfs;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::SupervisorPaths;
use crate::errors::{Result, SupervisorError};

/// Below this much free space (in KB) a warning is logged.
pub const MIN_FREE_SPACE_KB: u64 = 1_048_576;

const NETWORK_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// What the probes observed. Only informational; blocking failures are
/// returned as errors instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    /// Free space on the base directory's filesystem, if it could be read.
    pub free_space_kb: Option<u64>,
    /// `None` when the network probe is disabled.
    pub network_reachable: Option<bool>,
}

impl HealthReport {
    pub fn low_disk_space(&self) -> bool {
        self.free_space_kb.is_some_and(is_low_disk_space)
    }
}

pub fn is_low_disk_space(free_kb: u64) -> bool {
    free_kb < MIN_FREE_SPACE_KB
}

#[derive(Debug)]
pub struct HealthProbe<'a> {
    paths: &'a SupervisorPaths,
    network_target: Option<&'a str>,
}

impl<'a> HealthProbe<'a> {
    pub fn new(paths: &'a SupervisorPaths, network_target: Option<&'a str>) -> Self {
        Self {
            paths,
            network_target,
        }
    }

    /// Run all probes. Fails only if the log directory is not writable.
    pub async fn run(&self) -> Result<HealthReport> {
        let free_space_kb = match free_space_kb(&self.paths.base_dir) {
            Ok(kb) => {
                if is_low_disk_space(kb) {
                    warn!(
                        free_kb = kb,
                        threshold_kb = MIN_FREE_SPACE_KB,
                        "low disk space"
                    );
                } else {
                    debug!(free_kb = kb, "disk space ok");
                }
                Some(kb)
            }
            Err(e) => {
                warn!(error = %e, "could not determine free disk space");
                None
            }
        };

        check_writable(&self.paths.log_dir)?;
        debug!(log_dir = %self.paths.log_dir.display(), "log directory writable");

        let network_reachable = match self.network_target {
            Some(target) => {
                let ok = probe_network(target).await;
                if ok {
                    debug!(addr = target, "network reachable");
                } else {
                    warn!(addr = target, "network unreachable; continuing anyway");
                }
                Some(ok)
            }
            None => None,
        };

        info!("health checks completed");
        Ok(HealthReport {
            free_space_kb,
            network_reachable,
        })
    }
}

fn free_space_kb(path: &Path) -> nix::Result<u64> {
    let stat = statvfs(path)?;
    Ok(stat.blocks_available() as u64 * stat.fragment_size() as u64 / 1024)
}

/// Create and delete a probe file in `dir`.
pub fn check_writable(dir: &Path) -> Result<()> {
    let unwritable = |reason: String| SupervisorError::LogDirUnwritable {
        path: dir.to_path_buf(),
        reason,
    };

    fs::create_dir_all(dir).map_err(|e| unwritable(format!("cannot create directory: {e}")))?;

    let probe = dir.join(format!(".write_test_{}", std::process::id()));
    fs::write(&probe, b"ok").map_err(|e| unwritable(e.to_string()))?;
    fs::remove_file(&probe).map_err(|e| unwritable(e.to_string()))?;
    Ok(())
}

async fn probe_network(target: &str) -> bool {
    matches!(
        timeout(NETWORK_PROBE_TIMEOUT, TcpStream::connect(target)).await,
        Ok(Ok(_))
    )
}
