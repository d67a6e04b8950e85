#![allow(dead_code)]

pub use bop_supervisor_test_utils::builders;
pub use bop_supervisor_test_utils::fake_executor;
pub use bop_supervisor_test_utils::{LogCapture, init_tracing, with_timeout};

use std::process::{Child, Command};

/// A live process whose PID can be planted in a lock file.
pub struct LiveProcess(pub Child);

impl LiveProcess {
    pub fn spawn() -> Self {
        Self(Command::new("sleep").arg("30").spawn().unwrap())
    }

    pub fn pid(&self) -> u32 {
        self.0.id()
    }
}

impl Drop for LiveProcess {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// PID of a process that has already exited and been reaped.
pub fn dead_pid() -> u32 {
    let mut child = Command::new("true").spawn().unwrap();
    let pid = child.id();
    child.wait().unwrap();
    pid
}
