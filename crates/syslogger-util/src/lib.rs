//! Shared utilities for SysLogger
//!
//! This crate provides:
//! - Default paths for the pipe directory, log files, pid file and config
//! - Wall-clock time (with a debug-only mock override) and log timestamps

mod paths;
mod time;

pub use paths::*;
pub use time::*;
