//! Configuration parsing and validation for the SysLogger daemon
//!
//! Supports an optional TOML file with:
//! - Versioned schema
//! - Pipe directory and naming prefix
//! - Log, error log and pid file locations
//! - Sweep, read-timeout and shutdown timing
//! - Validation with clear error messages

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<DaemonSettings> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Like [`load_config`], but a missing file yields the default settings.
pub fn load_config_or_default(path: impl AsRef<Path>) -> ConfigResult<DaemonSettings> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(DaemonSettings::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<DaemonSettings> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(DaemonSettings::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn parse_minimal_config() {
        let settings = parse_config("config_version = 1").unwrap();
        assert_eq!(settings.pipe_prefix, syslogger_api::DEFAULT_PIPE_PREFIX);
        assert_eq!(settings.read_timeout, syslogger_api::READ_TIMEOUT);
    }

    #[test]
    fn parse_full_config() {
        let config = r#"
            config_version = 1

            [daemon]
            pipe_dir = "/run/syslogger"
            pipe_prefix = "applog"
            log_file = "/var/log/app.log"
            error_log_file = "/var/log/app.err"
            pid_file = "/run/syslogger.pid"
            sweep_interval_ms = 10
            read_timeout_ms = 500
            grace_period_ms = 1000
            max_workers = 16
        "#;

        let settings = parse_config(config).unwrap();
        assert_eq!(settings.pipe_dir, PathBuf::from("/run/syslogger"));
        assert_eq!(settings.pipe_prefix, "applog");
        assert_eq!(settings.sweep_interval, Duration::from_millis(10));
        assert_eq!(settings.read_timeout, Duration::from_millis(500));
        assert_eq!(settings.grace_period, Duration::from_secs(1));
        assert_eq!(settings.max_workers, 16);
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_values() {
        let config = r#"
            config_version = 1

            [daemon]
            pipe_prefix = ""
            max_workers = 0
        "#;

        match parse_config(config) {
            Err(ConfigError::ValidationFailed { errors }) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_config_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.max_workers, DEFAULT_MAX_WORKERS);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "config_version = 1\n[daemon]\nmax_workers = 3\n").unwrap();

        let settings = load_config(&path).unwrap();
        assert_eq!(settings.max_workers, 3);
    }
}
