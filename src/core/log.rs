//! Build log sink.
//!
//! The permission engine never fails in place of logging: every anomaly ends up
//! as an entry in a [`LogSink`] supplied by the caller. [`FilteredLog`] is the
//! default sink; it keeps the entries for the build report and mirrors each of
//! them as a `tracing` event.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{error, info, warn};

/// Number of error entries a [`FilteredLog`] keeps before it starts skipping.
pub const DEFAULT_MAX_ERRORS: usize = 20;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// A single formatted log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub severity: Severity,
    pub message: String,
}

/// Receiver of structured log entries.
pub trait LogSink {
    fn record(&mut self, entry: LogEntry);

    fn info(&mut self, message: String) {
        self.record(LogEntry {
            severity: Severity::Info,
            message,
        });
    }

    fn warning(&mut self, message: String) {
        self.record(LogEntry {
            severity: Severity::Warning,
            message,
        });
    }

    fn error(&mut self, message: String) {
        self.record(LogEntry {
            severity: Severity::Error,
            message,
        });
    }
}

/// Log of one build step.
///
/// Error entries are capped at `max_errors`; further errors are counted and
/// summarized by [`FilteredLog::skipped_errors`] instead of being stored.
#[derive(Debug, Clone)]
pub struct FilteredLog {
    title: String,
    max_errors: usize,
    entries: Vec<LogEntry>,
    error_count: usize,
}

impl FilteredLog {
    /// Creates an empty log. The title prefixes every mirrored tracing event.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_max_errors(title, DEFAULT_MAX_ERRORS)
    }

    pub fn with_max_errors(title: impl Into<String>, max_errors: usize) -> Self {
        Self {
            title: title.into(),
            max_errors,
            entries: Vec::new(),
            error_count: 0,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Messages of the given severity, in the order they were logged.
    pub fn messages(&self, severity: Severity) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.severity == severity)
            .map(|entry| entry.message.as_str())
            .collect()
    }

    pub fn info_messages(&self) -> Vec<&str> {
        self.messages(Severity::Info)
    }

    pub fn warning_messages(&self) -> Vec<&str> {
        self.messages(Severity::Warning)
    }

    pub fn error_messages(&self) -> Vec<&str> {
        self.messages(Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Number of error entries that were dropped because of the cap.
    pub fn skipped_errors(&self) -> usize {
        self.error_count.saturating_sub(self.max_errors)
    }
}

impl LogSink for FilteredLog {
    fn record(&mut self, entry: LogEntry) {
        match entry.severity {
            Severity::Info => info!("[{}] {}", self.title, entry.message),
            Severity::Warning => warn!("[{}] {}", self.title, entry.message),
            Severity::Error => error!("[{}] {}", self.title, entry.message),
        }

        if entry.severity == Severity::Error {
            self.error_count += 1;
            if self.error_count > self.max_errors {
                return;
            }
        }
        self.entries.push(entry);
    }
}

/// A sink shared between threads.
impl<L: LogSink> LogSink for Arc<Mutex<L>> {
    fn record(&mut self, entry: LogEntry) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(entry);
    }
}
