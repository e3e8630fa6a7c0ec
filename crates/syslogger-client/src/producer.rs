//! One-shot log line producer

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;
use std::fs::{File, OpenOptions, Permissions};
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use syslogger_api::{frame_message, PipeName, DEFAULT_PIPE_PREFIX, OPEN_TIMEOUT, PIPE_PERMISSIONS};
use tracing::debug;

use crate::{ClientError, ClientResult, ProcessIdentity, ProcfsNames};

/// Where and how patiently a producer delivers
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    pub pipe_dir: PathBuf,
    pub pipe_prefix: String,
    /// Bound on waiting for the daemon to open the pipe
    pub open_timeout: Duration,
    /// Pause between two open attempts
    pub retry_interval: Duration,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            pipe_dir: syslogger_util::default_pipe_dir(),
            pipe_prefix: DEFAULT_PIPE_PREFIX.to_string(),
            open_timeout: OPEN_TIMEOUT,
            retry_interval: Duration::from_millis(1),
        }
    }
}

/// Sends log lines to a running daemon
#[derive(Debug, Clone)]
pub struct Producer {
    config: ProducerConfig,
    identity: ProcessIdentity,
}

impl Producer {
    /// Producer for the calling process, named from procfs
    pub fn new(config: ProducerConfig) -> Self {
        let identity = ProcessIdentity::current(&ProcfsNames::new());
        Self::with_identity(config, identity)
    }

    pub fn with_identity(config: ProducerConfig, identity: ProcessIdentity) -> Self {
        Self { config, identity }
    }

    pub fn identity(&self) -> &ProcessIdentity {
        &self.identity
    }

    /// Send one message. Returns whether it was handed to the daemon.
    pub fn emit(&self, message: &str) -> bool {
        match self.try_emit(message) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "Emit failed");
                false
            }
        }
    }

    /// Send one message, reporting why it failed.
    pub fn try_emit(&self, message: &str) -> ClientResult<()> {
        let line = frame_message(self.identity.name.as_deref(), self.identity.pid, message)?;

        let name = PipeName::for_caller(&self.config.pipe_prefix, self.identity.pid, caller_tid())?;
        let path = self.config.pipe_dir.join(name.as_str());
        let deadline = Instant::now() + self.config.open_timeout;

        // The pipe belongs to the daemon from here on. If nobody opens it in
        // time it stays behind until a daemon sweeps it up.
        self.create_pipe(&path, deadline)?;
        let mut pipe = self.open_writer(&path, deadline)?;

        let written = pipe.write(line.as_bytes()).map_err(ClientError::Write)?;
        if written != line.len() {
            return Err(ClientError::ShortWrite {
                written,
                expected: line.len(),
            });
        }
        debug!(pipe = %name, bytes = written, "Line sent");
        Ok(())
    }

    /// Create the FIFO. A leftover pipe with the same name means the
    /// previous call from this thread has not been drained yet, so wait.
    fn create_pipe(&self, path: &Path, deadline: Instant) -> ClientResult<()> {
        loop {
            match nix::unistd::mkfifo(path, Mode::from_bits_truncate(PIPE_PERMISSIONS)) {
                Ok(()) => break,
                Err(Errno::EEXIST) if Instant::now() < deadline => {
                    thread::sleep(self.config.retry_interval);
                }
                Err(Errno::EEXIST) => {
                    return Err(ClientError::OpenTimedOut {
                        path: path.to_path_buf(),
                    });
                }
                Err(errno) => {
                    return Err(ClientError::CreatePipe {
                        path: path.to_path_buf(),
                        source: io::Error::from(errno),
                    });
                }
            }
        }

        // mkfifo is subject to the umask
        std::fs::set_permissions(path, Permissions::from_mode(PIPE_PERMISSIONS)).map_err(
            |source| ClientError::CreatePipe {
                path: path.to_path_buf(),
                source,
            },
        )
    }

    /// Open for writing without blocking, retrying while no reader exists.
    fn open_writer(&self, path: &Path, deadline: Instant) -> ClientResult<File> {
        loop {
            let attempt = OpenOptions::new()
                .write(true)
                .custom_flags(OFlag::O_NONBLOCK.bits())
                .open(path);

            match attempt {
                Ok(file) => return Ok(file),
                Err(e) if e.raw_os_error() == Some(Errno::ENXIO as i32) => {
                    if Instant::now() >= deadline {
                        return Err(ClientError::OpenTimedOut {
                            path: path.to_path_buf(),
                        });
                    }
                    thread::sleep(self.config.retry_interval);
                }
                Err(source) => {
                    return Err(ClientError::OpenPipe {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        }
    }
}

/// Identifier of the calling thread, unique within the process
#[cfg(any(target_os = "linux", target_os = "android"))]
fn caller_tid() -> u32 {
    nix::unistd::gettid().as_raw() as u32
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn caller_tid() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};

    static NEXT: AtomicU32 = AtomicU32::new(1);
    thread_local! {
        static TID: u32 = NEXT.fetch_add(1, Ordering::Relaxed);
    }
    TID.with(|tid| *tid)
}
