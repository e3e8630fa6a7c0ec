//! Core of the SysLogger daemon
//!
//! This crate is the heart of the daemon, containing:
//! - The pipe registry (which producer pipes are known and still present)
//! - The scanner that sweeps the pipe directory and dispatches workers
//! - The per-pipe worker that drains exactly one message
//! - The serialized writer for the main and error logs
//! - Cooperative termination and the ordered shutdown sequence

mod context;
mod daemon;
mod log_writer;
mod registry;
mod scanner;
mod shutdown;
mod termination;
mod worker;

pub use context::*;
pub use daemon::*;
pub use log_writer::*;
pub use registry::*;
pub use scanner::*;
pub use shutdown::*;
pub use termination::*;
pub use worker::*;

use std::path::PathBuf;
use thiserror::Error;

/// Core daemon errors
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Failed to open log file {path}: {source}")]
    LogOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot spawn worker: {running} workers already running")]
    SpawnFailed { running: usize },
}

pub type CoreResult<T> = Result<T, CoreError>;
