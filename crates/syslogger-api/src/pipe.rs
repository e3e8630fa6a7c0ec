//! Pipe naming
//!
//! A producer's pipe is named `<prefix><pid><separator><tid>`, for example
//! `syslogger4242n4243`. The daemon discovers pipes by prefix only; the ids
//! are informational on its side.

use std::fmt;

use crate::{FrameError, FrameResult};

/// Prefix every producer pipe carries
pub const DEFAULT_PIPE_PREFIX: &str = "syslogger";

/// Separates the process id from the thread id in a pipe name
pub const PIPE_NAME_SEPARATOR: char = 'n';

/// Longest pipe file name in bytes (26 with a C terminator)
pub const MAX_PIPE_NAME_LEN: usize = 25;

/// Digits needed for the largest Linux pid or tid (pid_max is 4194304)
pub const MAX_ID_DIGITS: usize = 7;

/// Check that a prefix leaves room for two maximal ids and the separator.
pub fn validate_prefix(prefix: &str) -> FrameResult<()> {
    if prefix.is_empty() {
        return Err(FrameError::InvalidPrefix("prefix cannot be empty".into()));
    }
    if prefix.contains('/') || prefix.contains('\0') {
        return Err(FrameError::InvalidPrefix(format!(
            "'{}' must not contain '/' or NUL",
            prefix
        )));
    }
    if prefix.ends_with(|c: char| c.is_ascii_digit()) {
        return Err(FrameError::InvalidPrefix(format!(
            "'{}' must not end in a digit",
            prefix
        )));
    }
    let longest = prefix.len() + 2 * MAX_ID_DIGITS + PIPE_NAME_SEPARATOR.len_utf8();
    if longest > MAX_PIPE_NAME_LEN {
        return Err(FrameError::InvalidPrefix(format!(
            "'{}' is too long ({} bytes with ids, max {})",
            prefix, longest, MAX_PIPE_NAME_LEN
        )));
    }
    Ok(())
}

/// File name of one producer pipe
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipeName(String);

impl PipeName {
    /// Build the pipe name for a call made by thread `tid` of process `pid`.
    pub fn for_caller(prefix: &str, pid: u32, tid: u32) -> FrameResult<Self> {
        let name = format!("{}{}{}{}", prefix, pid, PIPE_NAME_SEPARATOR, tid);
        if name.len() > MAX_PIPE_NAME_LEN {
            return Err(FrameError::NameTooLong { name });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PipeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Does a directory entry name look like a producer pipe?
pub fn has_pipe_prefix(name: &str, prefix: &str) -> bool {
    name.len() > prefix.len() && name.starts_with(prefix)
}

/// Ids encoded in a pipe name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeOrigin {
    pub pid: u32,
    pub tid: u32,
}

/// Recover the producer's pid and tid from a pipe name.
///
/// Returns `None` for names that carry the prefix but not the full
/// `<pid><separator><tid>` suffix.
pub fn parse_pipe_name(name: &str, prefix: &str) -> Option<PipeOrigin> {
    let rest = name.strip_prefix(prefix)?;
    let (pid, tid) = rest.split_once(PIPE_NAME_SEPARATOR)?;
    Some(PipeOrigin {
        pid: pid.parse().ok()?,
        tid: tid.parse().ok()?,
    })
}
