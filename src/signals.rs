// src/signals.rs

//! Signal handling and the run's cancellation context.
//!
//! SIGINT and SIGTERM are turned into a [`ShutdownSignal`] published on a
//! `watch` channel. Components that can block (only the job wait) hold a
//! [`ShutdownListener`] and react to it; the orchestrator checks it at stage
//! boundaries. Lock release on these paths comes from the lock guard being
//! dropped as the run unwinds, not from the handler itself.

use std::fmt;

use anyhow::Context;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::errors::Result;
use crate::types;

/// An external request to stop the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT (Ctrl-C).
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl ShutdownSignal {
    /// Reserved exit status for a run stopped by this signal.
    pub fn exit_code(self) -> i32 {
        match self {
            ShutdownSignal::Interrupt => types::INTERRUPTED,
            ShutdownSignal::Terminate => types::TERMINATED,
        }
    }
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "SIGINT"),
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Sending half of the cancellation context.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<Option<ShutdownSignal>>,
}

impl ShutdownTrigger {
    /// Publish a shutdown request. Only the first request is kept.
    pub fn fire(&self, signal: ShutdownSignal) {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(signal);
                true
            } else {
                false
            }
        });
    }
}

/// Receiving half of the cancellation context.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<Option<ShutdownSignal>>,
}

impl ShutdownListener {
    /// The shutdown request received so far, if any.
    pub fn current(&self) -> Option<ShutdownSignal> {
        *self.rx.borrow()
    }

    /// Wait until a shutdown is requested.
    ///
    /// If the trigger is dropped without firing this never resolves.
    pub async fn recv(&mut self) -> ShutdownSignal {
        loop {
            if let Some(signal) = *self.rx.borrow_and_update() {
                return signal;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked trigger/listener pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownListener) {
    let (tx, rx) = watch::channel(None);
    (ShutdownTrigger { tx }, ShutdownListener { rx })
}

/// Installs the SIGINT/SIGTERM handlers for the lifetime of a run.
pub struct SignalCoordinator {
    handle: JoinHandle<()>,
}

impl SignalCoordinator {
    /// Install handlers and return the listener the run observes.
    ///
    /// Must be called from within a Tokio runtime. Once installed, the
    /// default "die immediately" disposition for both signals is replaced,
    /// so every path out of the run goes through normal unwinding.
    pub fn install() -> Result<(Self, ShutdownListener)> {
        let mut interrupt =
            signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
        let mut terminate =
            signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
        let (trigger, listener) = shutdown_channel();

        let handle = tokio::spawn(async move {
            let received = tokio::select! {
                _ = interrupt.recv() => ShutdownSignal::Interrupt,
                _ = terminate.recv() => ShutdownSignal::Terminate,
            };
            warn!(signal = %received, "shutdown requested; stopping run and releasing lock");
            trigger.fire(received);
            // Keep the trigger alive so listeners keep seeing the request.
            std::future::pending::<()>().await;
        });

        Ok((Self { handle }, listener))
    }
}

impl Drop for SignalCoordinator {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
