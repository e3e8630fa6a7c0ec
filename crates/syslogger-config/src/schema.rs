//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Daemon settings
    #[serde(default)]
    pub daemon: RawDaemonConfig,
}

/// Daemon-level settings; every field falls back to a default
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDaemonConfig {
    /// Directory scanned for producer pipes (default: /tmp)
    pub pipe_dir: Option<PathBuf>,

    /// Name prefix of producer pipes (default: "syslogger")
    pub pipe_prefix: Option<String>,

    /// Main log (default: /var/tmp/SysLogger.log)
    pub log_file: Option<PathBuf>,

    /// Error log (default: /var/tmp/Syslogger_error.log)
    pub error_log_file: Option<PathBuf>,

    /// Single-instance pid file (default: /tmp/SysLogger.pid)
    pub pid_file: Option<PathBuf>,

    /// Pause between directory sweeps
    pub sweep_interval_ms: Option<u64>,

    /// How long a worker waits for its producer to write
    pub read_timeout_ms: Option<u64>,

    /// How long shutdown waits for in-flight workers
    pub grace_period_ms: Option<u64>,

    /// Upper bound on concurrently running workers
    pub max_workers: Option<usize>,
}
