//! Daemon wiring: log files, scanner, shutdown

use std::sync::Arc;
use syslogger_config::DaemonSettings;
use tracing::{info, warn};

use crate::{
    CoreResult, DaemonContext, InstanceMarker, LogWriter, Scanner, ShutdownCoordinator,
    ShutdownReport, Termination,
};

/// Line written to the main log once the logs are open
pub const DAEMON_STARTED: &str = "SysLogger daemon started";

/// A ready-to-run daemon instance
pub struct Daemon {
    ctx: Arc<DaemonContext>,
    settings: DaemonSettings,
    marker: Box<dyn InstanceMarker>,
}

impl Daemon {
    /// Open both logs and record the start.
    ///
    /// The marker is released again if the logs cannot be opened.
    pub fn new(
        settings: DaemonSettings,
        termination: Termination,
        mut marker: Box<dyn InstanceMarker>,
    ) -> CoreResult<Self> {
        let writer = match LogWriter::open(&settings.log_file, &settings.error_log_file) {
            Ok(writer) => writer,
            Err(e) => {
                if let Err(release_err) = marker.release() {
                    warn!(error = %release_err, "Failed to release instance marker");
                }
                return Err(e);
            }
        };

        writer.append(DAEMON_STARTED);
        info!(
            log_file = %settings.log_file.display(),
            error_log_file = %settings.error_log_file.display(),
            "Daemon started"
        );

        let ctx = DaemonContext::new(&settings, writer, termination);
        Ok(Self {
            ctx,
            settings,
            marker,
        })
    }

    pub fn context(&self) -> &Arc<DaemonContext> {
        &self.ctx
    }

    /// Scan until termination, then shut down in order.
    pub async fn run(self) -> ShutdownReport {
        let scanner = Scanner::new(
            Arc::clone(&self.ctx),
            self.settings.sweep_interval,
            self.settings.max_workers,
        );
        let (reason, workers) = scanner.run().await;

        ShutdownCoordinator::new(self.ctx, self.settings.grace_period, self.marker)
            .shutdown(reason, workers)
            .await
    }
}
