//! Directory scanner and worker dispatch
//!
//! Each sweep reconciles the registry with the pipes present in the pipe
//! directory: new pipes get an entry and a worker, entries whose pipe is
//! gone are dropped.

use std::os::unix::fs::FileTypeExt;
use std::sync::Arc;
use std::time::Duration;
use syslogger_api::has_pipe_prefix;
use tracing::{debug, error, info, warn};

use crate::{CoreResult, DaemonContext, ShutdownReason, WorkerSet};

/// What one sweep changed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub spawned: usize,
    pub reaped: usize,
}

pub struct Scanner {
    ctx: Arc<DaemonContext>,
    workers: WorkerSet,
    sweep_interval: Duration,
    /// Set while the pipe directory cannot be read, so the failure is
    /// reported once instead of on every sweep
    dir_unreadable: bool,
}

impl Scanner {
    pub fn new(ctx: Arc<DaemonContext>, sweep_interval: Duration, max_workers: usize) -> Self {
        Self {
            ctx,
            workers: WorkerSet::new(max_workers),
            sweep_interval,
            dir_unreadable: false,
        }
    }

    /// Sweep until termination is requested or a worker cannot be spawned.
    ///
    /// Hands back the still-running workers for the shutdown drain.
    pub async fn run(mut self) -> (ShutdownReason, WorkerSet) {
        info!(
            pipe_dir = %self.ctx.pipe_dir.display(),
            prefix = %self.ctx.pipe_prefix,
            "Scanner running"
        );

        loop {
            if self.ctx.termination.is_requested() {
                return (ShutdownReason::Requested, self.workers);
            }

            if let Err(e) = self.sweep().await {
                error!(error = %e, "Sweep failed, forcing shutdown");
                self.ctx.termination.request();
                return (ShutdownReason::SpawnFailed, self.workers);
            }

            tokio::select! {
                _ = self.ctx.termination.requested() => {}
                _ = tokio::time::sleep(self.sweep_interval) => {}
            }
        }
    }

    /// One reconciliation pass over the pipe directory
    pub async fn sweep(&mut self) -> CoreResult<SweepStats> {
        let mut stats = SweepStats::default();
        let ctx = Arc::clone(&self.ctx);
        self.workers.reap_finished();

        {
            let mut registry = ctx.registry.lock().await;
            registry.clear_all_active();

            let entries = match std::fs::read_dir(&ctx.pipe_dir) {
                Ok(entries) => entries,
                Err(e) => {
                    let path = ctx.pipe_dir.display();
                    if self.dir_unreadable {
                        debug!(path = %path, error = %e, "Pipe directory still unreadable");
                    } else {
                        warn!(path = %path, error = %e, "Failed to read pipe directory");
                        self.dir_unreadable = true;
                    }
                    return Ok(stats);
                }
            };
            if self.dir_unreadable {
                info!(path = %ctx.pipe_dir.display(), "Pipe directory readable again");
                self.dir_unreadable = false;
            }

            for entry in entries.flatten() {
                let is_fifo = entry.file_type().map(|t| t.is_fifo()).unwrap_or(false);
                if !is_fifo {
                    continue;
                }
                let file_name = entry.file_name();
                let Some(name) = file_name.to_str() else {
                    continue;
                };
                if !has_pipe_prefix(name, &ctx.pipe_prefix) {
                    continue;
                }

                if registry.mark_seen(name) || ctx.termination.is_requested() {
                    continue;
                }

                let handle = registry.insert(name);
                let worker = self.workers.spawn(Arc::clone(&ctx), name.to_string())?;
                registry.set_worker(handle, worker);
                debug!(pipe = %name, worker = %worker, "Pipe discovered");
                stats.spawned += 1;
            }

            for gone in registry.reap_inactive() {
                debug!(pipe = %gone.name(), "Pipe gone, entry reaped");
                stats.reaped += 1;
            }
        }

        self.workers.reap_finished();
        Ok(stats)
    }

    pub fn running_workers(&self) -> usize {
        self.workers.len()
    }
}
