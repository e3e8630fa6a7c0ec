//! Ordered shutdown of the daemon

use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::{DaemonContext, WorkerSet};

/// Line written to the main log once the daemon has stopped
pub const DAEMON_STOPPED: &str = "SysLogger daemon stopped";

/// Line written to the error log when shutdown was forced by a spawn failure
pub const FORCED_EXIT: &str = "Thread creation error, forced exit";

/// Whatever marks this daemon as the single running instance.
///
/// Released as the last step of shutdown.
pub trait InstanceMarker: Send {
    fn release(&mut self) -> io::Result<()>;
}

/// Marker for instances that do not claim anything
#[derive(Debug, Default)]
pub struct NoMarker;

impl InstanceMarker for NoMarker {
    fn release(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Why the scanner stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Termination was requested, normally by a signal
    Requested,
    /// A worker could not be spawned
    SpawnFailed,
}

impl ShutdownReason {
    pub fn is_forced(&self) -> bool {
        matches!(self, ShutdownReason::SpawnFailed)
    }
}

/// Summary of a completed shutdown
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    pub reason: ShutdownReason,
    /// Every worker finished within the grace period
    pub workers_finished: bool,
    /// Named registry entries still present at teardown
    pub entries_released: usize,
}

impl ShutdownReport {
    /// Process exit status: 0 for a clean stop, 1 for a forced one
    pub fn exit_code(&self) -> u8 {
        match self.reason {
            ShutdownReason::Requested => 0,
            ShutdownReason::SpawnFailed => 1,
        }
    }
}

/// Runs the shutdown steps in order, once
pub struct ShutdownCoordinator {
    ctx: Arc<DaemonContext>,
    grace_period: Duration,
    marker: Box<dyn InstanceMarker>,
}

impl ShutdownCoordinator {
    pub fn new(
        ctx: Arc<DaemonContext>,
        grace_period: Duration,
        marker: Box<dyn InstanceMarker>,
    ) -> Self {
        Self {
            ctx,
            grace_period,
            marker,
        }
    }

    pub async fn shutdown(
        mut self,
        reason: ShutdownReason,
        mut workers: WorkerSet,
    ) -> ShutdownReport {
        info!(reason = ?reason, running = workers.len(), "Shutting down");

        // Workers only stop cooperatively; make sure they can see it
        self.ctx.termination.request();
        let workers_finished = workers.drain(self.grace_period).await;

        let entries_released = self.ctx.registry.lock().await.destroy_all();

        if reason.is_forced() {
            self.ctx.writer.append_error(FORCED_EXIT);
        }
        self.ctx.writer.append(DAEMON_STOPPED);
        self.ctx.writer.close();

        if let Err(e) = self.marker.release() {
            warn!(error = %e, "Failed to release instance marker");
        }

        info!(workers_finished, entries_released, "Shutdown complete");

        ShutdownReport {
            reason,
            workers_finished,
            entries_released,
        }
    }
}
