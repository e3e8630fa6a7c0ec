//! Configuration validation

use crate::schema::{RawConfig, RawDaemonConfig};
use syslogger_api::{validate_prefix, OPEN_TIMEOUT};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Invalid pipe prefix: {0}")]
    InvalidPrefix(String),

    #[error("Invalid timing '{field}': {message}")]
    InvalidTiming { field: &'static str, message: String },

    #[error("Invalid limit '{field}': {message}")]
    InvalidLimit { field: &'static str, message: String },

    #[error("Path conflict: {0}")]
    PathConflict(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    validate_daemon(&config.daemon)
}

fn validate_daemon(daemon: &RawDaemonConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(prefix) = &daemon.pipe_prefix
        && let Err(e) = validate_prefix(prefix)
    {
        errors.push(ValidationError::InvalidPrefix(e.to_string()));
    }

    // Producers give up opening after OPEN_TIMEOUT, so a sweep must come
    // around well before that.
    if let Some(ms) = daemon.sweep_interval_ms {
        if ms == 0 {
            errors.push(ValidationError::InvalidTiming {
                field: "sweep_interval_ms",
                message: "must be greater than zero".into(),
            });
        } else if u128::from(ms) >= OPEN_TIMEOUT.as_millis() {
            errors.push(ValidationError::InvalidTiming {
                field: "sweep_interval_ms",
                message: format!(
                    "{}ms must be below the producer open timeout of {}ms",
                    ms,
                    OPEN_TIMEOUT.as_millis()
                ),
            });
        }
    }

    if daemon.read_timeout_ms == Some(0) {
        errors.push(ValidationError::InvalidTiming {
            field: "read_timeout_ms",
            message: "must be greater than zero".into(),
        });
    }

    if daemon.max_workers == Some(0) {
        errors.push(ValidationError::InvalidLimit {
            field: "max_workers",
            message: "must be at least 1".into(),
        });
    }

    let log_file = daemon
        .log_file
        .clone()
        .unwrap_or_else(syslogger_util::default_log_file);
    let error_log_file = daemon
        .error_log_file
        .clone()
        .unwrap_or_else(syslogger_util::default_error_log_file);
    if log_file == error_log_file {
        errors.push(ValidationError::PathConflict(format!(
            "log_file and error_log_file are both {}",
            log_file.display()
        )));
    }

    errors
}
