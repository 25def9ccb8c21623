//! Per-session event log with size-based rotation.
//!
//! Each record is one line:
//!
//! ```text
//! 2024-10-22 13:45:07,123 - 20241022-13:45:07-123456 - INFO - 🐚 bash - Executing bash command: ls
//! ```
//!
//! Records go to `<dir>/<session id>.log`, which is rotated to `.log.1`,
//! `.log.2`, ... once it would grow past `max_bytes`, keeping at most
//! `backup_count` old files. Every record is also emitted through `tracing`,
//! so whatever subscriber the binary installs shows the session live.
//!
//! The log is write-only, and a failing disk never fails the caller: write
//! errors are reported through `tracing::warn!` and the record is dropped.

use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Severity of a session log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Rotation bounds for a session log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRotation {
    pub max_bytes: u64,
    pub backup_count: usize,
}

impl Default for LogRotation {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
            backup_count: 5,
        }
    }
}

/// The event log of one session.
pub struct SessionLog {
    session_id: String,
    sink: Option<Mutex<RotatingFile>>,
}

impl std::fmt::Debug for SessionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLog")
            .field("session_id", &self.session_id)
            .field("file", &self.path())
            .finish()
    }
}

impl SessionLog {
    /// Open (or append to) `<dir>/<session_id>.log`, creating `dir` if needed.
    pub fn open(dir: &Path, session_id: &str, rotation: LogRotation) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{session_id}.log"));
        let file = RotatingFile::open(path, rotation)?;
        Ok(Self {
            session_id: session_id.to_string(),
            sink: Some(Mutex::new(file)),
        })
    }

    /// A log that only mirrors to `tracing` and writes no file.
    pub fn mirror_only(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            sink: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Path of the live log file, if this log writes one.
    pub fn path(&self) -> Option<PathBuf> {
        self.sink.as_ref().map(|sink| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .path
                .clone()
        })
    }

    /// Append one record.
    pub fn log(&self, level: LogLevel, prefix: &str, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(session = %self.session_id, prefix, "{message}"),
            LogLevel::Info => tracing::info!(session = %self.session_id, prefix, "{message}"),
            LogLevel::Warn => tracing::warn!(session = %self.session_id, prefix, "{message}"),
            LogLevel::Error => tracing::error!(session = %self.session_id, prefix, "{message}"),
        }

        let Some(sink) = &self.sink else {
            return;
        };

        let record = format!(
            "{} - {} - {} - {} - {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            self.session_id,
            level,
            prefix,
            message
        );

        let mut file = sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = file.write_record(&record) {
            tracing::warn!(
                session = %self.session_id,
                path = %file.path.display(),
                error = %e,
                "Failed to write session log record"
            );
        }
    }

    /// A handle that stamps every record with `prefix`.
    pub fn scoped<'a>(&'a self, prefix: &'a str) -> ScopedLog<'a> {
        ScopedLog { log: self, prefix }
    }
}

/// A [`SessionLog`] bound to one component prefix.
#[derive(Debug, Clone, Copy)]
pub struct ScopedLog<'a> {
    log: &'a SessionLog,
    prefix: &'a str,
}

impl ScopedLog<'_> {
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log.log(LogLevel::Debug, self.prefix, message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log.log(LogLevel::Info, self.prefix, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log.log(LogLevel::Warn, self.prefix, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log.log(LogLevel::Error, self.prefix, message.as_ref());
    }
}

struct RotatingFile {
    path: PathBuf,
    rotation: LogRotation,
    file: File,
    size: u64,
}

impl RotatingFile {
    fn open(path: PathBuf, rotation: LogRotation) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            rotation,
            file,
            size,
        })
    }

    fn write_record(&mut self, record: &str) -> io::Result<()> {
        let len = record.len() as u64;
        // A record larger than max_bytes still goes into an empty file.
        if self.size > 0 && self.size + len > self.rotation.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(record.as_bytes())?;
        self.file.flush()?;
        self.size += len;
        Ok(())
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        if self.rotation.backup_count > 0 {
            for index in (1..self.rotation.backup_count).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    std::fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            std::fs::rename(&self.path, self.backup_path(1))?;
        }

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.size = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_format() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::open(dir.path(), "20241022-13:45:07-000001", LogRotation::default())
            .unwrap();
        log.scoped("🐚 bash").info("Executing bash command: ls");

        let content = std::fs::read_to_string(log.path().unwrap()).unwrap();
        let line = content.lines().next().unwrap();
        let fields: Vec<&str> = line.splitn(5, " - ").collect();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[1], "20241022-13:45:07-000001");
        assert_eq!(fields[2], "INFO");
        assert_eq!(fields[3], "🐚 bash");
        assert_eq!(fields[4], "Executing bash command: ls");
    }

    #[test]
    fn levels_render_uppercase() {
        assert_eq!(LogLevel::Warn.to_string(), "WARNING");
        assert_eq!(LogLevel::Error.to_string(), "ERROR");
    }

    #[test]
    fn reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        {
            let log = SessionLog::open(dir.path(), "s1", LogRotation::default()).unwrap();
            log.scoped("x").info("first");
        }
        let log = SessionLog::open(dir.path(), "s1", LogRotation::default()).unwrap();
        log.scoped("x").info("second");

        let content = std::fs::read_to_string(dir.path().join("s1.log")).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn rotation_keeps_bounded_backups() {
        let dir = tempfile::tempdir().unwrap();
        let rotation = LogRotation {
            max_bytes: 200,
            backup_count: 2,
        };
        let log = SessionLog::open(dir.path(), "s2", rotation).unwrap();
        for i in 0..40 {
            log.scoped("test").info(format!("record number {i}"));
        }

        let base = dir.path().join("s2.log");
        assert!(base.exists());
        assert!(dir.path().join("s2.log.1").exists());
        assert!(dir.path().join("s2.log.2").exists());
        assert!(!dir.path().join("s2.log.3").exists());
        assert!(std::fs::metadata(&base).unwrap().len() <= 200);

        // The newest record is in the live file.
        let live = std::fs::read_to_string(&base).unwrap();
        assert!(live.contains("record number 39"));
    }

    #[test]
    fn zero_backups_truncates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let rotation = LogRotation {
            max_bytes: 150,
            backup_count: 0,
        };
        let log = SessionLog::open(dir.path(), "s3", rotation).unwrap();
        for i in 0..10 {
            log.scoped("test").info(format!("record number {i}"));
        }
        assert!(!dir.path().join("s3.log.1").exists());
        let live = std::fs::read_to_string(dir.path().join("s3.log")).unwrap();
        assert!(live.contains("record number 9"));
        assert!(!live.contains("record number 0"));
    }

    #[test]
    fn mirror_only_writes_nothing() {
        let log = SessionLog::mirror_only("s4");
        log.scoped("test").error("nowhere to go");
        assert!(log.path().is_none());
        assert_eq!(log.session_id(), "s4");
    }
}
