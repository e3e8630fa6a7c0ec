//! Pipe protocol for SysLogger
//!
//! This crate defines the contract between producers and the daemon:
//! - Pipe naming (prefix, producer pid, separator, thread id)
//! - Message framing and the per-message size limit
//! - Handshake timing (open retry bound, read timeout, sweep interval)

mod message;
mod pipe;

pub use message::*;
pub use pipe::*;

use std::time::Duration;
use thiserror::Error;

/// Maximum bytes in one framed message, enforced by the producer.
/// The daemon's read buffer has exactly this size.
pub const MAX_MESSAGE_BYTES: usize = 200;

/// Permissions pipes are created with. Any local user may produce log lines.
pub const PIPE_PERMISSIONS: u32 = 0o666;

/// How long a producer keeps retrying to open its pipe for writing
pub const OPEN_TIMEOUT: Duration = Duration::from_secs(2);

/// How long a worker waits for data after opening a pipe
pub const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Pause between two directory sweeps of the daemon
pub const SWEEP_INTERVAL: Duration = Duration::from_millis(5);

/// Time in-flight workers get to finish once termination is requested
pub const GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Protocol errors raised while naming pipes or framing messages
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("Message prefix of {len} bytes leaves no room for the message")]
    PrefixTooLong { len: usize },

    #[error("Pipe name too long: {name}")]
    NameTooLong { name: String },

    #[error("Invalid pipe prefix: {0}")]
    InvalidPrefix(String),
}

pub type FrameResult<T> = Result<T, FrameError>;
