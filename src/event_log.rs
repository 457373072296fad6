//! Append-only audit log for invalid inputs, failed predictions and
//! unrealistic results.
//!
//! Writing is best effort: a failure is reported on the console and handed
//! back as a [`LogReceipt`], never as an error the caller has to handle.

use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Severity of an audit event, written uppercased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Error,
    Warn,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::Error => "ERROR",
            EventKind::Warn => "WARN",
        })
    }
}

/// Outcome of a single append. Inspecting it is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogReceipt {
    Written,
    Failed(String),
}

impl LogReceipt {
    pub fn is_written(&self) -> bool {
        matches!(self, LogReceipt::Written)
    }
}

/// Writer for the audit log file.
#[derive(Debug, Clone)]
pub struct EventLogger {
    path: PathBuf,
}

impl EventLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event line. Never panics and never returns an error.
    pub fn log(&self, kind: EventKind, field: &str, value: &str, message: &str) -> LogReceipt {
        let line = format_line(Local::now(), kind, field, value, message);

        match self.append(&line) {
            Ok(()) => {
                debug!(path = %self.path.display(), kind = %kind, field = %field, "Audit event written");
                LogReceipt::Written
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Logging failed");
                LogReceipt::Failed(e.to_string())
            }
        }
    }

    fn append(&self, line: &str) -> io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        // One write call per line so concurrent appenders interleave whole lines
        file.write_all(line.as_bytes())
    }
}

/// `[<timestamp>] <KIND> | Field: <field> | Value: '<value>' | <message>`
pub fn format_line(
    timestamp: DateTime<Local>,
    kind: EventKind,
    field: &str,
    value: &str,
    message: &str,
) -> String {
    format!(
        "[{}] {} | Field: {} | Value: '{}' | {}\n",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        kind,
        single_line(field),
        single_line(value),
        single_line(message)
    )
}

fn single_line(text: &str) -> String {
    text.replace('\r', "\\r").replace('\n', "\\n")
}
