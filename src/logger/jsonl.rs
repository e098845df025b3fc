//! Activity log: append-only line-delimited JSON for monitor sessions.
//!
//! Each event is serialized in memory and appended with one `write_all`, so a
//! reader tailing the file never sees half a line. When the file grows past
//! its limit it is moved to `<file>.1` and a fresh one is started.
//!
//! Degradation: file → stderr (`[LCD-JSONL]` prefix) → discard. Logging never
//! fails the caller.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{LcdError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    MonitorStart,
    MonitorStop,
    TickError,
}

/// One log line. Only `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_errors: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// A bare entry stamped with the current UTC time.
    #[must_use]
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            event,
            severity,
            device: None,
            fields: None,
            config_hash: None,
            ticks: None,
            frames: None,
            device_errors: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }

    /// Record a failure with its stable code.
    #[must_use]
    pub fn with_error(mut self, err: &LcdError) -> Self {
        self.error_code = Some(err.code().to_string());
        self.error_message = Some(err.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ActivityLogConfig {
    pub path: PathBuf,
    /// Rotate once the file would exceed this many bytes.
    pub max_size_bytes: u64,
}

impl ActivityLogConfig {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_size_bytes: 4 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    File,
    Stderr,
    Discard,
}

/// Append-only JSONL writer.
#[derive(Debug)]
pub struct ActivityLog {
    config: Option<ActivityLogConfig>,
    file: Option<File>,
    sink: Sink,
    bytes_written: u64,
}

impl ActivityLog {
    /// Open (or create) the log file, falling back to stderr if that fails.
    #[must_use]
    pub fn open(config: ActivityLogConfig) -> Self {
        let mut log = Self {
            config: None,
            file: None,
            sink: Sink::Discard,
            bytes_written: 0,
        };
        match open_append(&config.path) {
            Ok((file, size)) => {
                log.file = Some(file);
                log.sink = Sink::File;
                log.bytes_written = size;
            }
            Err(e) => {
                eprintln!("[LCD-JSONL] {e}; logging to stderr");
                log.sink = Sink::Stderr;
            }
        }
        log.config = Some(config);
        log
    }

    /// A log that drops everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            config: None,
            file: None,
            sink: Sink::Discard,
            bytes_written: 0,
        }
    }

    /// Where entries currently go: `"file"`, `"stderr"` or `"discard"`.
    #[must_use]
    pub fn sink(&self) -> &'static str {
        match self.sink {
            Sink::File => "file",
            Sink::Stderr => "stderr",
            Sink::Discard => "discard",
        }
    }

    pub fn record(&mut self, entry: &LogEntry) {
        if self.sink == Sink::Discard {
            return;
        }
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                eprintln!("[LCD-JSONL] serialize error: {e}");
                return;
            }
        };
        self.append(&line);
    }

    fn append(&mut self, line: &str) {
        if self.sink == Sink::File {
            self.rotate_if_needed(line.len() as u64);
        }
        match self.sink {
            Sink::File => {
                let written = self
                    .file
                    .as_mut()
                    .map(|f| f.write_all(line.as_bytes()));
                if let Some(Ok(())) = written {
                    self.bytes_written += line.len() as u64;
                } else {
                    eprintln!("[LCD-JSONL] write failed; logging to stderr");
                    self.file = None;
                    self.sink = Sink::Stderr;
                    self.append(line);
                }
            }
            Sink::Stderr => {
                if write!(io::stderr(), "[LCD-JSONL] {line}").is_err() {
                    self.sink = Sink::Discard;
                }
            }
            Sink::Discard => {}
        }
    }

    fn rotate_if_needed(&mut self, incoming: u64) {
        let Some(config) = &self.config else {
            return;
        };
        if self.bytes_written + incoming <= config.max_size_bytes || self.bytes_written == 0 {
            return;
        }
        self.file = None;
        let rotated = rotated_name(&config.path);
        if let Err(e) = fs::rename(&config.path, &rotated) {
            eprintln!(
                "[LCD-JSONL] rotate to {} failed: {e}; logging to stderr",
                rotated.display()
            );
            self.sink = Sink::Stderr;
            return;
        }
        match open_append(&config.path) {
            Ok((file, size)) => {
                self.file = Some(file);
                self.bytes_written = size;
            }
            Err(e) => {
                eprintln!("[LCD-JSONL] reopen after rotation failed: {e}");
                self.sink = Sink::Stderr;
            }
        }
    }
}

/// Open or create `path` for appending; returns the file and its current size.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| LcdError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LcdError::io(path, source))?;
    let size = file.metadata().map_or(0, |m| m.len());
    Ok((file, size))
}

/// `activity.jsonl` → `activity.jsonl.1`.
fn rotated_name(base: &Path) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".1");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::DeviceOp;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn entries_are_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let mut log = ActivityLog::open(ActivityLogConfig::new(&path));
        assert_eq!(log.sink(), "file");

        let mut start = LogEntry::new(EventType::MonitorStart, Severity::Info);
        start.fields = Some(vec!["ip".to_string(), "temp".to_string()]);
        log.record(&start);
        log.record(&LogEntry::new(EventType::MonitorStop, Severity::Info));

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "monitor_start");
        assert_eq!(lines[0]["severity"], "info");
        assert_eq!(lines[0]["fields"][1], "temp");
        assert_eq!(lines[1]["event"], "monitor_stop");
    }

    #[test]
    fn unset_fields_are_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparse.jsonl");
        let mut log = ActivityLog::open(ActivityLogConfig::new(&path));
        log.record(&LogEntry::new(EventType::MonitorStart, Severity::Info));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("\"device\""));
        assert!(!raw.contains("\"ticks\""));
        assert!(!raw.contains("\"error_code\""));
    }

    #[test]
    fn error_entries_carry_code_and_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.jsonl");
        let mut log = ActivityLog::open(ActivityLogConfig::new(&path));
        let err = LcdError::device(DeviceOp::Write, io::Error::other("EIO"));
        log.record(&LogEntry::new(EventType::TickError, Severity::Warning).with_error(&err));

        let lines = read_lines(&path);
        assert_eq!(lines[0]["event"], "tick_error");
        assert_eq!(lines[0]["error_code"], "LCD-2002");
        assert!(
            lines[0]["error_message"]
                .as_str()
                .unwrap()
                .contains("device write failed")
        );
    }

    #[test]
    fn oversized_file_rotates_to_dot_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rot.jsonl");
        let mut config = ActivityLogConfig::new(&path);
        config.max_size_bytes = 100;
        let mut log = ActivityLog::open(config);

        for _ in 0..6 {
            log.record(&LogEntry::new(EventType::TickError, Severity::Warning));
        }

        assert!(path.exists());
        assert!(rotated_name(&path).exists());
        assert!(fs::metadata(&path).unwrap().len() <= 100);
    }

    #[test]
    fn failed_rotation_stops_growing_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stuck.jsonl");
        // A non-empty directory at the rotation target makes the rename fail.
        let blocker = rotated_name(&path);
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), "").unwrap();

        let mut config = ActivityLogConfig::new(&path);
        config.max_size_bytes = 100;
        let mut log = ActivityLog::open(config);

        for _ in 0..6 {
            log.record(&LogEntry::new(EventType::TickError, Severity::Warning));
        }

        assert_eq!(log.sink(), "stderr");
        assert!(fs::metadata(&path).unwrap().len() <= 100);
        assert!(blocker.is_dir());
    }

    #[test]
    fn unwritable_path_falls_back_to_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let log = ActivityLog::open(ActivityLogConfig::new(blocker.join("activity.jsonl")));
        assert_eq!(log.sink(), "stderr");
    }

    #[test]
    fn disabled_log_discards() {
        let mut log = ActivityLog::disabled();
        log.record(&LogEntry::new(EventType::MonitorStart, Severity::Info));
        assert_eq!(log.sink(), "discard");
    }
}
