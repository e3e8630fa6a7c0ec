//! State shared between the scanner and every worker

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use syslogger_config::DaemonSettings;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{LogWriter, PipeRegistry, Termination};

/// Everything a worker needs, behind one `Arc`
pub struct DaemonContext {
    pub registry: Mutex<PipeRegistry>,
    pub writer: LogWriter,
    pub termination: Termination,
    pub pipe_dir: PathBuf,
    pub pipe_prefix: String,
    pub read_timeout: Duration,
}

impl DaemonContext {
    pub fn new(settings: &DaemonSettings, writer: LogWriter, termination: Termination) -> Arc<Self> {
        Arc::new(Self {
            registry: Mutex::new(PipeRegistry::create()),
            writer,
            termination,
            pipe_dir: settings.pipe_dir.clone(),
            pipe_prefix: settings.pipe_prefix.clone(),
            read_timeout: settings.read_timeout,
        })
    }

    pub fn pipe_path(&self, name: &str) -> PathBuf {
        self.pipe_dir.join(name)
    }

    /// Forget a pipe: drop its registry entry and delete its file.
    ///
    /// Both happen under the registry lock, so a sweep never sees the entry
    /// without its file or the other way round.
    pub async fn release_pipe(&self, name: &str, path: &Path) {
        let mut registry = self.registry.lock().await;
        registry.remove(name);

        match std::fs::remove_file(path) {
            Ok(()) => debug!(pipe = %name, "Pipe released"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(pipe = %name, error = %e, "Failed to remove pipe file"),
        }
    }
}
