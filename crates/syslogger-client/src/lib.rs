//! Producer side of SysLogger
//!
//! Any process can append a line to the shared log by calling
//! [`Producer::emit`]. Each call creates its own named pipe in the pipe
//! directory, waits (bounded) for the daemon to open it, writes one framed
//! line and returns. The daemon deletes the pipe after reading it.
//!
//! This crate is synchronous and needs no async runtime.

mod identity;
mod producer;

pub use identity::*;
pub use producer::*;

use std::path::PathBuf;
use syslogger_api::FrameError;
use thiserror::Error;

/// Reasons a single emit can fail
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Framing error: {0}")]
    Frame(#[from] FrameError),

    #[error("Failed to create pipe {path}: {source}")]
    CreatePipe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open pipe {path}: {source}")]
    OpenPipe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No reader opened {path} in time")]
    OpenTimedOut { path: PathBuf },

    #[error("Write to pipe failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("Short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
}

pub type ClientResult<T> = Result<T, ClientError>;
