//! Append-only audit log for a migration run.
//!
//! Every stage of the pipeline receives the `RunLog` explicitly and records what it did.
//! Entries are mirrored to the `tracing` console stream as they are recorded, and the full
//! snapshot is embedded in the final report as the authoritative diagnostic record.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::models::{LogEntry, LogLevel};

/// Tracing target carrying audit entries, kept separate from diagnostic events.
pub const AUDIT_TARGET: &str = "pfmig::audit";

#[derive(Debug, Default)]
pub struct RunLog {
    entries: Vec<LogEntry>,
    warnings: usize,
    errors: usize,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry stamped with the current time.
    pub fn record(&mut self, message: impl Into<String>, level: LogLevel) {
        self.record_at(Utc::now(), message, level);
    }

    /// Append an entry with an explicit timestamp. Timestamps earlier than the previous
    /// entry are clamped so the log stays non-decreasing.
    pub fn record_at(&mut self, timestamp: DateTime<Utc>, message: impl Into<String>, level: LogLevel) {
        let timestamp = match self.entries.last() {
            Some(last) if last.timestamp > timestamp => last.timestamp,
            _ => timestamp,
        };
        let message = message.into();

        match level {
            LogLevel::Info | LogLevel::Success => {
                info!(target: AUDIT_TARGET, audit = level.as_str(), "{}", message)
            }
            LogLevel::Warning => {
                self.warnings += 1;
                warn!(target: AUDIT_TARGET, audit = level.as_str(), "{}", message);
            }
            LogLevel::Error => {
                self.errors += 1;
                error!(target: AUDIT_TARGET, audit = level.as_str(), "{}", message);
            }
        }

        self.entries.push(LogEntry {
            timestamp,
            level,
            message,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(message, LogLevel::Info);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.record(message, LogLevel::Warning);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.record(message, LogLevel::Error);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.record(message, LogLevel::Success);
    }

    /// Ordered copy of every entry recorded so far.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.clone()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn counts_warnings_and_errors() {
        let mut log = RunLog::new();
        log.info("starting");
        log.warning("stats missing");
        log.warning("stats missing again");
        log.error("boom");
        log.success("done");

        assert_eq!(log.len(), 5);
        assert_eq!(log.warning_count(), 2);
        assert_eq!(log.error_count(), 1);
    }

    #[test]
    fn snapshot_preserves_insertion_order() {
        let mut log = RunLog::new();
        log.info("one");
        log.error("two");
        log.success("three");

        let messages: Vec<_> = log.snapshot().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["one", "two", "three"]);
    }

    #[test]
    fn snapshot_is_detached_from_later_writes() {
        let mut log = RunLog::new();
        log.info("one");
        let snap = log.snapshot();
        log.info("two");
        assert_eq!(snap.len(), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let mut log = RunLog::new();
        let later = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap();

        log.record_at(later, "first", LogLevel::Info);
        log.record_at(earlier, "second", LogLevel::Info);

        let snap = log.snapshot();
        assert_eq!(snap[1].timestamp, later);
        assert!(snap.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
