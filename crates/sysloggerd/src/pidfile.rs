//! Single-instance pid file

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use syslogger_core::InstanceMarker;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PidFileError {
    #[error("Pid file error: {0}")]
    Io(#[from] io::Error),

    #[error("SysLogger is already running (pid file {path} is locked)")]
    AlreadyRunning { path: PathBuf },

    #[error("Failed to lock pid file {path}: {errno}")]
    Lock { path: PathBuf, errno: Errno },

    #[error("Pid file {path} does not hold a valid pid")]
    Invalid { path: PathBuf },

    #[error("Failed to signal pid {pid}: {errno}")]
    Signal { pid: i32, errno: Errno },
}

/// Pid file held with an exclusive advisory lock for the daemon's lifetime
pub struct PidFile {
    path: PathBuf,
    lock: Option<Flock<File>>,
}

impl PidFile {
    /// Create or open the file, lock it and write our pid into it.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self, PidFileError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o644)
            .open(&path)?;

        let mut lock = Flock::lock(file, FlockArg::LockExclusiveNonblock).map_err(
            |(_, errno)| {
                if errno == Errno::EWOULDBLOCK {
                    PidFileError::AlreadyRunning { path: path.clone() }
                } else {
                    PidFileError::Lock {
                        path: path.clone(),
                        errno,
                    }
                }
            },
        )?;

        // Only truncate once the lock is ours, or we'd wipe a live daemon's pid
        lock.set_len(0)?;
        writeln!(lock, "{}", std::process::id())?;
        lock.sync_all()?;

        info!(path = %path.display(), pid = std::process::id(), "Pid file acquired");
        Ok(Self {
            path,
            lock: Some(lock),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InstanceMarker for PidFile {
    fn release(&mut self) -> io::Result<()> {
        let Some(lock) = self.lock.take() else {
            return Ok(());
        };

        // Remove while still locked so a new instance never sees our pid
        let removed = std::fs::remove_file(&self.path);
        lock.unlock().map_err(|(_, errno)| io::Error::from(errno))?;
        debug!(path = %self.path.display(), "Pid file released");
        removed
    }
}

/// Read the pid a running daemon recorded.
pub fn read_pid(path: &Path) -> Result<i32, PidFileError> {
    let content = std::fs::read_to_string(path)?;
    content
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|pid| *pid > 0)
        .ok_or_else(|| PidFileError::Invalid {
            path: path.to_path_buf(),
        })
}

/// Result of asking a daemon to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// SIGTERM was delivered to this pid
    Signalled(i32),
    /// No pid file exists
    NotRunning,
    /// The recorded pid no longer exists
    Stale(i32),
}

/// Send SIGTERM to the daemon recorded in `path`.
pub fn request_stop(path: &Path) -> Result<StopOutcome, PidFileError> {
    let pid = match read_pid(path) {
        Ok(pid) => pid,
        Err(PidFileError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(StopOutcome::NotRunning);
        }
        Err(e) => return Err(e),
    };

    match kill(Pid::from_raw(pid), Signal::SIGTERM) {
        Ok(()) => Ok(StopOutcome::Signalled(pid)),
        Err(Errno::ESRCH) => Ok(StopOutcome::Stale(pid)),
        Err(errno) => Err(PidFileError::Signal { pid, errno }),
    }
}
