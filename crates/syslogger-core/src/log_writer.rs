//! Serialized writer for the main log and the error log
//!
//! Both files are opened once and stay open until shutdown. A single lock
//! covers both handles so an error line can never land in the middle of a
//! main-log line being written by another task.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{CoreError, CoreResult};

/// Mode the log files are created with
pub const LOG_FILE_MODE: u32 = 0o666;

struct LogFiles {
    main: File,
    error: File,
}

/// Append-only writer shared by every worker and the shutdown path
pub struct LogWriter {
    files: Mutex<Option<LogFiles>>,
    main_path: PathBuf,
    error_path: PathBuf,
}

impl LogWriter {
    /// Open (creating if absent) both logs in append mode.
    pub fn open(main_path: impl AsRef<Path>, error_path: impl AsRef<Path>) -> CoreResult<Self> {
        let main_path = main_path.as_ref().to_path_buf();
        let error_path = error_path.as_ref().to_path_buf();

        let main = open_append(&main_path)?;
        let error = open_append(&error_path)?;

        debug!(
            main = %main_path.display(),
            error = %error_path.display(),
            "Log files opened"
        );

        Ok(Self {
            files: Mutex::new(Some(LogFiles { main, error })),
            main_path,
            error_path,
        })
    }

    /// Append one timestamped line to the main log.
    ///
    /// The line goes out in a single `write`. A short or failed write is
    /// recorded in the error log instead of being returned.
    pub fn append(&self, message: &str) {
        let line = format!("{} {}\n", timestamp(), message);

        let mut guard = self.lock();
        let Some(files) = guard.as_mut() else {
            warn!(message, "Log already closed, dropping line");
            return;
        };

        match files.main.write(line.as_bytes()) {
            Ok(written) if written == line.len() => {}
            Ok(written) => {
                let diag = format!(
                    "{}: Short write to {}: {} of {} bytes\n",
                    timestamp(),
                    self.main_path.display(),
                    written,
                    line.len()
                );
                write_error_line(&mut files.error, &diag);
            }
            Err(e) => {
                let diag = format!(
                    "{}: Write to {} failed: {}\n",
                    timestamp(),
                    self.main_path.display(),
                    e
                );
                write_error_line(&mut files.error, &diag);
            }
        }
    }

    /// Append one timestamped line to the error log.
    pub fn append_error(&self, message: &str) {
        let mut line = format!("{}: {}", timestamp(), message);
        if !line.ends_with('\n') {
            line.push('\n');
        }

        let mut guard = self.lock();
        match guard.as_mut() {
            Some(files) => write_error_line(&mut files.error, &line),
            None => warn!(message, "Error log already closed, dropping line"),
        }
    }

    /// Flush and close both files. Later appends are dropped.
    pub fn close(&self) {
        let Some(mut files) = self.lock().take() else {
            return;
        };

        if let Err(e) = files.main.flush() {
            warn!(error = %e, path = %self.main_path.display(), "Failed to flush log");
        }
        if let Err(e) = files.error.flush() {
            warn!(error = %e, path = %self.error_path.display(), "Failed to flush error log");
        }
        debug!("Log files closed");
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    pub fn main_path(&self) -> &Path {
        &self.main_path
    }

    pub fn error_path(&self) -> &Path {
        &self.error_path
    }

    fn lock(&self) -> MutexGuard<'_, Option<LogFiles>> {
        // A panicking writer cannot leave a half-updated Option behind
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn open_append(path: &Path) -> CoreResult<File> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .mode(LOG_FILE_MODE)
        .open(path)
        .map_err(|source| CoreError::LogOpen {
            path: path.to_path_buf(),
            source,
        })
}

fn write_error_line(file: &mut File, line: &str) {
    if let Err(e) = file.write_all(line.as_bytes()) {
        warn!(error = %e, "Failed to write error log");
    }
}

fn timestamp() -> String {
    syslogger_util::format_log_timestamp(&syslogger_util::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn open_in(dir: &Path) -> LogWriter {
        LogWriter::open(dir.join("main.log"), dir.join("error.log")).unwrap()
    }

    fn is_well_formed(line: &str, message: &str) -> bool {
        // "<Weekday> <YYYY-MM-DD> <HH:MM:SS>:<mmm> <message>"
        let mut parts = line.splitn(4, ' ');
        let (Some(weekday), Some(date), Some(time), Some(rest)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        weekday.ends_with("day")
            && date.len() == 10
            && time.len() == 12
            && time.as_bytes()[8] == b':'
            && rest == message
    }

    #[test]
    fn append_writes_one_formatted_line() {
        let dir = tempdir().unwrap();
        let writer = open_in(dir.path());

        writer.append("alice 4242: hello");

        let content = std::fs::read_to_string(dir.path().join("main.log")).unwrap();
        assert!(content.ends_with('\n'));
        let line = content.trim_end_matches('\n');
        assert!(is_well_formed(line, "alice 4242: hello"), "bad line: {line:?}");
    }

    #[test]
    fn error_line_gets_colon_and_single_newline() {
        let dir = tempdir().unwrap();
        let writer = open_in(dir.path());

        writer.append_error("/tmp/syslogger1n1: Permission denied\n");
        writer.append_error("Worker exits");

        let content = std::fs::read_to_string(dir.path().join("error.log")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(": /tmp/syslogger1n1: Permission denied"));
        assert!(lines[1].ends_with(": Worker exits"));
    }

    #[test]
    fn append_preserves_existing_content() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("main.log"), "earlier\n").unwrap();

        let writer = open_in(dir.path());
        writer.append("later");

        let content = std::fs::read_to_string(dir.path().join("main.log")).unwrap();
        assert!(content.starts_with("earlier\n"));
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn appends_after_close_are_dropped() {
        let dir = tempdir().unwrap();
        let writer = open_in(dir.path());

        writer.append("before");
        writer.close();
        assert!(!writer.is_open());
        writer.append("after");
        writer.append_error("after");
        writer.close();

        let content = std::fs::read_to_string(dir.path().join("main.log")).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(std::fs::read_to_string(dir.path().join("error.log")).unwrap().is_empty());
    }

    #[test]
    fn open_failure_names_the_path() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("main.log");

        let err = LogWriter::open(&missing, dir.path().join("error.log"))
            .err()
            .expect("open should fail");
        match err {
            CoreError::LogOpen { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn concurrent_appends_do_not_interleave() {
        let dir = tempdir().unwrap();
        let writer = Arc::new(open_in(dir.path()));
        let threads = 16;
        let per_thread = 50;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let writer = Arc::clone(&writer);
                std::thread::spawn(move || {
                    for i in 0..per_thread {
                        writer.append(&format!("producer{t} {i}: message body"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = std::fs::read_to_string(dir.path().join("main.log")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), threads * per_thread);
        for line in lines {
            let message = line.splitn(4, ' ').nth(3).unwrap();
            assert!(is_well_formed(line, message), "bad line: {line:?}");
            assert!(message.ends_with(": message body"), "bad line: {line:?}");
        }
    }
}
