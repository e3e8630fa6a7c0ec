//! Per-pipe worker and the set that tracks running workers
//!
//! A worker drains exactly one message from one pipe, hands it to the log
//! writer and deletes the pipe. It never reads a second message.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use syslogger_api::{decode_payload, MAX_MESSAGE_BYTES};
use tokio::io::AsyncReadExt;
use tokio::net::unix::pipe;
use tokio::task::{Id as WorkerId, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{CoreError, CoreResult, DaemonContext};

/// Pause before re-reading a pipe that reported end-of-file because no
/// producer has connected yet
const EOF_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// How a worker ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// A message was read and appended to the main log
    Logged,
    /// No data arrived within the read timeout
    TimedOut,
    /// Termination was requested while waiting for data
    Cancelled,
    /// The pipe could not be opened for reading
    OpenFailed,
    /// Reading failed with something other than "would block"
    ReadFailed,
}

/// Drain the pipe `name` under the context's pipe directory.
///
/// Whatever the outcome, the registry entry and the pipe file are gone when
/// this returns.
pub async fn drain_pipe(ctx: Arc<DaemonContext>, name: String) -> WorkerOutcome {
    let path = ctx.pipe_path(&name);

    let mut receiver = match open_for_reading(&path) {
        Ok(receiver) => receiver,
        Err(e) => {
            warn!(pipe = %name, error = %e, "Failed to open pipe");
            ctx.writer.append_error(&format!("{}: {}\n", path.display(), e));
            ctx.writer.append_error("Worker exits\n");
            ctx.release_pipe(&name, &path).await;
            return WorkerOutcome::OpenFailed;
        }
    };

    let outcome = read_one(&ctx, &name, &mut receiver).await;
    drop(receiver);

    ctx.release_pipe(&name, &path).await;
    debug!(pipe = %name, outcome = ?outcome, "Worker finished");
    outcome
}

async fn read_one(ctx: &DaemonContext, name: &str, receiver: &mut pipe::Receiver) -> WorkerOutcome {
    let mut buf = [0u8; MAX_MESSAGE_BYTES];
    let deadline = Instant::now() + ctx.read_timeout;

    loop {
        tokio::select! {
            biased;

            res = receiver.read(&mut buf) => match res {
                Ok(0) => {
                    // No writer yet; only seen where the receiver cannot be
                    // opened read-write
                    tokio::time::sleep(EOF_POLL_INTERVAL).await;
                }
                Ok(n) => {
                    let message = decode_payload(&buf[..n]);
                    ctx.writer.append(&message);
                    return WorkerOutcome::Logged;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => {
                    debug!(pipe = %name, error = %e, "Pipe read failed");
                    return WorkerOutcome::ReadFailed;
                }
            },

            _ = ctx.termination.requested() => return WorkerOutcome::Cancelled,

            _ = tokio::time::sleep_until(deadline) => return WorkerOutcome::TimedOut,
        }
    }
}

fn open_for_reading(path: &Path) -> io::Result<pipe::Receiver> {
    let mut options = pipe::OpenOptions::new();
    // Holding a write end ourselves means reads wait for data instead of
    // returning end-of-file before the producer has opened its side
    #[cfg(target_os = "linux")]
    options.read_write(true);
    options.open_receiver(path)
}

/// Running workers, capped at a fixed size
pub struct WorkerSet {
    tasks: JoinSet<WorkerOutcome>,
    max_workers: usize,
}

impl WorkerSet {
    pub fn new(max_workers: usize) -> Self {
        Self {
            tasks: JoinSet::new(),
            max_workers,
        }
    }

    /// Start a worker for `name`. Fails once the cap is reached.
    ///
    /// Finished workers are collected first so only live ones count.
    pub fn spawn(&mut self, ctx: Arc<DaemonContext>, name: String) -> CoreResult<WorkerId> {
        self.reap_finished();
        if self.tasks.len() >= self.max_workers {
            return Err(CoreError::SpawnFailed {
                running: self.tasks.len(),
            });
        }

        let handle = self.tasks.spawn(drain_pipe(ctx, name));
        Ok(handle.id())
    }

    /// Collect workers that already finished. Returns how many were collected.
    pub fn reap_finished(&mut self) -> usize {
        let mut reaped = 0;
        while let Some(res) = self.tasks.try_join_next() {
            if let Err(e) = res {
                warn!(error = %e, "Worker task failed");
            }
            reaped += 1;
        }
        reaped
    }

    /// Wait up to `grace` for every worker to finish.
    ///
    /// Returns false if some were still running; those are detached, not
    /// aborted.
    pub async fn drain(&mut self, grace: Duration) -> bool {
        let finished = tokio::time::timeout(grace, async {
            while let Some(res) = self.tasks.join_next().await {
                if let Err(e) = res {
                    warn!(error = %e, "Worker task failed");
                }
            }
        })
        .await
        .is_ok();

        if !finished {
            info!(running = self.tasks.len(), "Grace period expired, detaching workers");
            self.tasks.detach_all();
        }
        finished
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LogWriter, Termination};
    use nix::sys::stat::Mode;
    use syslogger_config::DaemonSettings;
    use tempfile::{tempdir, TempDir};
    use tokio::io::AsyncWriteExt;

    fn context(dir: &TempDir, read_timeout: Duration) -> Arc<DaemonContext> {
        let mut settings = DaemonSettings::rooted_at(dir.path());
        settings.read_timeout = read_timeout;
        let writer = LogWriter::open(&settings.log_file, &settings.error_log_file).unwrap();
        DaemonContext::new(&settings, writer, Termination::new())
    }

    fn make_fifo(ctx: &DaemonContext, name: &str) -> std::path::PathBuf {
        let path = ctx.pipe_path(name);
        nix::unistd::mkfifo(path.as_path(), Mode::from_bits_truncate(0o666)).unwrap();
        path
    }

    async fn send(path: &Path, payload: &[u8]) {
        let mut sender = loop {
            match pipe::OpenOptions::new().open_sender(path) {
                Ok(sender) => break sender,
                Err(_) => tokio::time::sleep(Duration::from_millis(5)).await,
            }
        };
        sender.write_all(payload).await.unwrap();
    }

    fn main_log(dir: &TempDir) -> String {
        std::fs::read_to_string(dir.path().join("SysLogger.log")).unwrap_or_default()
    }

    fn error_log(dir: &TempDir) -> String {
        std::fs::read_to_string(dir.path().join("Syslogger_error.log")).unwrap_or_default()
    }

    #[tokio::test]
    async fn logs_one_message_and_removes_pipe() {
        let dir = tempdir().unwrap();
        let ctx = context(&dir, Duration::from_secs(2));
        let path = make_fifo(&ctx, "syslogger10n11");
        ctx.registry.lock().await.insert("syslogger10n11");

        let worker = tokio::spawn(drain_pipe(ctx.clone(), "syslogger10n11".into()));
        send(&path, b"alice 4242: hello").await;

        assert_eq!(worker.await.unwrap(), WorkerOutcome::Logged);
        assert!(!path.exists());
        assert!(!ctx.registry.lock().await.contains("syslogger10n11"));
        assert!(main_log(&dir).trim_end().ends_with(" alice 4242: hello"));
    }

    #[tokio::test]
    async fn silent_producer_times_out_without_logging() {
        let dir = tempdir().unwrap();
        let ctx = context(&dir, Duration::from_millis(100));
        let path = make_fifo(&ctx, "syslogger10n12");
        ctx.registry.lock().await.insert("syslogger10n12");

        let outcome = drain_pipe(ctx.clone(), "syslogger10n12".into()).await;

        assert_eq!(outcome, WorkerOutcome::TimedOut);
        assert!(!path.exists());
        assert!(ctx.registry.lock().await.is_empty());
        assert!(main_log(&dir).is_empty());
        assert!(error_log(&dir).is_empty());
    }

    #[tokio::test]
    async fn termination_cancels_pending_read() {
        let dir = tempdir().unwrap();
        let ctx = context(&dir, Duration::from_secs(30));
        let path = make_fifo(&ctx, "syslogger10n13");

        let worker = tokio::spawn(drain_pipe(ctx.clone(), "syslogger10n13".into()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        ctx.termination.request();

        let outcome = tokio::time::timeout(Duration::from_secs(1), worker)
            .await
            .expect("worker should notice termination")
            .unwrap();
        assert_eq!(outcome, WorkerOutcome::Cancelled);
        assert!(!path.exists());
        assert!(main_log(&dir).is_empty());
    }

    #[tokio::test]
    async fn regular_file_fails_to_open() {
        let dir = tempdir().unwrap();
        let ctx = context(&dir, Duration::from_secs(2));
        let path = ctx.pipe_path("syslogger10n14");
        std::fs::write(&path, b"not a pipe").unwrap();
        ctx.registry.lock().await.insert("syslogger10n14");

        let outcome = drain_pipe(ctx.clone(), "syslogger10n14".into()).await;

        assert_eq!(outcome, WorkerOutcome::OpenFailed);
        assert!(!path.exists());
        assert!(ctx.registry.lock().await.is_empty());
        let errors = error_log(&dir);
        assert!(errors.contains("syslogger10n14: "));
        assert!(errors.trim_end().ends_with(": Worker exits"));
        assert!(main_log(&dir).is_empty());
    }

    #[tokio::test]
    async fn spawn_fails_at_capacity() {
        let dir = tempdir().unwrap();
        let ctx = context(&dir, Duration::from_secs(30));
        make_fifo(&ctx, "syslogger10n15");
        make_fifo(&ctx, "syslogger10n16");

        let mut workers = WorkerSet::new(1);
        workers.spawn(ctx.clone(), "syslogger10n15".into()).unwrap();
        let err = workers.spawn(ctx.clone(), "syslogger10n16".into()).unwrap_err();
        assert!(matches!(err, CoreError::SpawnFailed { running: 1 }));

        ctx.termination.request();
        assert!(workers.drain(Duration::from_secs(1)).await);
        assert!(workers.is_empty());
    }

    #[tokio::test]
    async fn finished_workers_free_their_slot() {
        let dir = tempdir().unwrap();
        let ctx = context(&dir, Duration::from_millis(20));
        let first = make_fifo(&ctx, "syslogger10n18");
        make_fifo(&ctx, "syslogger10n19");

        let mut workers = WorkerSet::new(1);
        workers.spawn(ctx.clone(), "syslogger10n18".into()).unwrap();

        // Let the first worker time out without collecting it
        for _ in 0..100 {
            if !first.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!first.exists());
        tokio::time::sleep(Duration::from_millis(20)).await;

        workers.spawn(ctx.clone(), "syslogger10n19".into()).unwrap();
        assert_eq!(workers.len(), 1);
        assert!(workers.drain(Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn drain_detaches_stragglers() {
        let dir = tempdir().unwrap();
        let ctx = context(&dir, Duration::from_secs(30));
        make_fifo(&ctx, "syslogger10n17");

        let mut workers = WorkerSet::new(4);
        workers.spawn(ctx.clone(), "syslogger10n17".into()).unwrap();

        assert!(!workers.drain(Duration::from_millis(50)).await);
        assert!(workers.is_empty());
        ctx.termination.request();
    }
}
