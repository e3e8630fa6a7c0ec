//! Validated daemon settings

use crate::schema::RawConfig;
use std::path::PathBuf;
use std::time::Duration;
use syslogger_api::{DEFAULT_PIPE_PREFIX, GRACE_PERIOD, READ_TIMEOUT, SWEEP_INTERVAL};

/// Default cap on concurrently running workers
pub const DEFAULT_MAX_WORKERS: usize = 1024;

/// Validated settings ready for use by the daemon
#[derive(Debug, Clone)]
pub struct DaemonSettings {
    pub pipe_dir: PathBuf,
    pub pipe_prefix: String,
    pub log_file: PathBuf,
    pub error_log_file: PathBuf,
    pub pid_file: PathBuf,
    pub sweep_interval: Duration,
    pub read_timeout: Duration,
    pub grace_period: Duration,
    pub max_workers: usize,
}

impl DaemonSettings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let daemon = raw.daemon;
        let defaults = Self::default();

        Self {
            pipe_dir: daemon.pipe_dir.unwrap_or(defaults.pipe_dir),
            pipe_prefix: daemon.pipe_prefix.unwrap_or(defaults.pipe_prefix),
            log_file: daemon.log_file.unwrap_or(defaults.log_file),
            error_log_file: daemon.error_log_file.unwrap_or(defaults.error_log_file),
            pid_file: daemon.pid_file.unwrap_or(defaults.pid_file),
            sweep_interval: daemon
                .sweep_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.sweep_interval),
            read_timeout: daemon
                .read_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.read_timeout),
            grace_period: daemon
                .grace_period_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.grace_period),
            max_workers: daemon.max_workers.unwrap_or(defaults.max_workers),
        }
    }

    /// Settings rooted in a single directory: pipes, logs and pid file all
    /// live under `dir`. Used by tests and throwaway instances.
    pub fn rooted_at(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            pipe_dir: dir.clone(),
            log_file: dir.join("SysLogger.log"),
            error_log_file: dir.join("Syslogger_error.log"),
            pid_file: dir.join("SysLogger.pid"),
            ..Self::default()
        }
    }
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            pipe_dir: syslogger_util::default_pipe_dir(),
            pipe_prefix: DEFAULT_PIPE_PREFIX.to_string(),
            log_file: syslogger_util::default_log_file(),
            error_log_file: syslogger_util::default_error_log_file(),
            pid_file: syslogger_util::default_pid_file(),
            sweep_interval: SWEEP_INTERVAL,
            read_timeout: READ_TIMEOUT,
            grace_period: GRACE_PERIOD,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rooted_settings_keep_everything_in_one_dir() {
        let settings = DaemonSettings::rooted_at("/tmp/x");
        assert_eq!(settings.pipe_dir, PathBuf::from("/tmp/x"));
        assert!(settings.log_file.starts_with("/tmp/x"));
        assert!(settings.error_log_file.starts_with("/tmp/x"));
        assert!(settings.pid_file.starts_with("/tmp/x"));
        assert_eq!(settings.sweep_interval, SWEEP_INTERVAL);
    }
}
