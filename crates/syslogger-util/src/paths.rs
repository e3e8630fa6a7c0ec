//! Default paths for SysLogger components
//!
//! The daemon and every producer must agree on the pipe directory, so it is
//! resolved the same way on both sides:
//! - Pipes: `$SYSLOGGER_PIPE_DIR` or `/tmp`
//! - Logs: `/var/tmp/SysLogger.log` and `/var/tmp/Syslogger_error.log`
//! - Pid file: `/tmp/SysLogger.pid`
//! - Config: `$SYSLOGGER_CONFIG`, `$XDG_CONFIG_HOME/syslogger/config.toml`
//!   or `~/.config/syslogger/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the pipe directory
pub const SYSLOGGER_PIPE_DIR_ENV: &str = "SYSLOGGER_PIPE_DIR";

/// Environment variable for overriding the config file path
pub const SYSLOGGER_CONFIG_ENV: &str = "SYSLOGGER_CONFIG";

/// Well-known directory the producers create their pipes in
const PIPE_DIR: &str = "/tmp";

const LOG_FILE: &str = "/var/tmp/SysLogger.log";
const ERROR_LOG_FILE: &str = "/var/tmp/Syslogger_error.log";
const PID_FILE: &str = "/tmp/SysLogger.pid";

/// Application subdirectory name
const APP_DIR: &str = "syslogger";
const CONFIG_FILENAME: &str = "config.toml";

/// Get the default pipe directory.
///
/// Order of precedence:
/// 1. `$SYSLOGGER_PIPE_DIR` environment variable (if set)
/// 2. `/tmp`
pub fn default_pipe_dir() -> PathBuf {
    if let Ok(path) = std::env::var(SYSLOGGER_PIPE_DIR_ENV) {
        return PathBuf::from(path);
    }

    pipe_dir_without_env()
}

/// Get the pipe directory without checking the SYSLOGGER_PIPE_DIR env var.
pub fn pipe_dir_without_env() -> PathBuf {
    PathBuf::from(PIPE_DIR)
}

/// Main log file, appended to by the daemon
pub fn default_log_file() -> PathBuf {
    PathBuf::from(LOG_FILE)
}

/// Error log file, appended to by the daemon
pub fn default_error_log_file() -> PathBuf {
    PathBuf::from(ERROR_LOG_FILE)
}

/// Single-instance marker holding the running daemon's pid
pub fn default_pid_file() -> PathBuf {
    PathBuf::from(PID_FILE)
}

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$SYSLOGGER_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/syslogger/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/syslogger/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(SYSLOGGER_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    // Last resort
    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}
