use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Separator used in source folder paths (`\Sales\EMEA`).
pub const PATH_SEPARATOR: char = '\\';

/// A statistic that may not have been retrievable from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Stat<T> {
    Known(T),
    Unknown,
}

impl<T> Stat<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Stat::Known(v) => Some(v),
            Stat::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Stat::Unknown)
    }
}

impl<T> From<Option<T>> for Stat<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Stat::Known(v),
            None => Stat::Unknown,
        }
    }
}

/// One folder of the source inventory. Immutable once collected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub name: String,
    pub identity: String,
    pub parent_path: String,
    pub item_count: Stat<u64>,
    /// Bytes.
    pub total_size: Stat<u64>,
    pub last_modified: Stat<DateTime<Utc>>,
    pub has_subfolders: bool,
    pub mail_enabled: bool,
}

impl FolderRecord {
    /// Number of path separators in the parent path.
    pub fn depth(&self) -> usize {
        self.parent_path.matches(PATH_SEPARATOR).count()
    }

    /// Full source path of the folder itself.
    pub fn full_path(&self) -> String {
        if self.parent_path.ends_with(PATH_SEPARATOR) {
            format!("{}{}", self.parent_path, self.name)
        } else {
            format!("{}{}{}", self.parent_path, PATH_SEPARATOR, self.name)
        }
    }
}

/// Lifecycle of a single folder within a migration batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderState {
    Pending,
    InProgress,
    Success,
    Failed,
}

impl FolderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FolderState::Success | FolderState::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    Success,
    Failed,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Success => write!(f, "Success"),
            OutcomeStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Terminal result of attempting to migrate one folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationOutcome {
    pub folder_name: String,
    pub status: OutcomeStatus,
    pub items_migrated: u64,
    pub error_message: String,
    pub timestamp: DateTime<Utc>,
}

impl MigrationOutcome {
    pub fn success(folder_name: &str, items_migrated: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            folder_name: folder_name.to_string(),
            status: OutcomeStatus::Success,
            items_migrated,
            error_message: String::new(),
            timestamp,
        }
    }

    pub fn failed(folder_name: &str, error: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            folder_name: folder_name.to_string(),
            status: OutcomeStatus::Failed,
            items_migrated: 0,
            error_message: error.into(),
            timestamp,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Success => "SUCCESS",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// Descriptor returned by the destination's liveness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationInfo {
    pub id: String,
    pub display_name: String,
}

/// Run-wide bookkeeping, opened at start and finalized once when the report is built.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetadata {
    pub run_id: Uuid,
    pub batch_label: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub error_count: usize,
    pub warning_count: usize,
    pub organization: Option<OrganizationInfo>,
}

impl RunMetadata {
    pub fn open(batch_prefix: &str, start_time: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            batch_label: format!("{}_{}", batch_prefix, start_time.format("%Y%m%d_%H%M%S")),
            start_time,
            end_time: None,
            error_count: 0,
            warning_count: 0,
            organization: None,
        }
    }

    /// Close the run. Only the first call takes effect.
    pub fn finalize(&mut self, end_time: DateTime<Utc>, error_count: usize, warning_count: usize) {
        if self.end_time.is_some() {
            return;
        }
        self.end_time = Some(end_time.max(self.start_time));
        self.error_count = error_count;
        self.warning_count = warning_count;
    }

    pub fn elapsed(&self) -> chrono::Duration {
        match self.end_time {
            Some(end) => end - self.start_time,
            None => chrono::Duration::zero(),
        }
    }
}

/// Format a byte count using binary units (`1.5 MB`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Format a duration as `1h 02m 03s`, `2m 05s` or `7s`.
pub fn format_duration(duration: chrono::Duration) -> String {
    let total = duration.num_seconds().max(0);
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn folder(parent: &str, name: &str) -> FolderRecord {
        FolderRecord {
            name: name.to_string(),
            identity: format!("id-{}", name),
            parent_path: parent.to_string(),
            item_count: Stat::Unknown,
            total_size: Stat::Unknown,
            last_modified: Stat::Unknown,
            has_subfolders: false,
            mail_enabled: false,
        }
    }

    #[test]
    fn depth_counts_separators() {
        assert_eq!(folder("\\", "Sales").depth(), 1);
        assert_eq!(folder("\\Sales\\EMEA", "Leads").depth(), 2);
        assert_eq!(folder("", "Root").depth(), 0);
    }

    #[test]
    fn full_path_joins_parent() {
        assert_eq!(folder("\\", "Sales").full_path(), "\\Sales");
        assert_eq!(folder("\\Sales", "EMEA").full_path(), "\\Sales\\EMEA");
    }

    #[test]
    fn unknown_is_distinct_from_zero() {
        let zero: Stat<u64> = Stat::Known(0);
        assert_ne!(zero, Stat::Unknown);
        assert_eq!(zero.known(), Some(&0));
        assert!(Stat::<u64>::Unknown.known().is_none());
    }

    #[test]
    fn outcome_constructors_respect_invariants() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let ok = MigrationOutcome::success("A", 12, ts);
        assert!(ok.error_message.is_empty());
        let failed = MigrationOutcome::failed("B", "boom", ts);
        assert_eq!(failed.items_migrated, 0);
        assert_eq!(failed.status, OutcomeStatus::Failed);
    }

    #[test]
    fn batch_label_uses_start_time() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        let meta = RunMetadata::open("PFMigration", start);
        assert_eq!(meta.batch_label, "PFMigration_20240301_090507");
    }

    #[test]
    fn finalize_only_once() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut meta = RunMetadata::open("PF", start);
        meta.finalize(start + chrono::Duration::seconds(75), 1, 2);
        meta.finalize(start + chrono::Duration::seconds(500), 9, 9);
        assert_eq!(meta.elapsed().num_seconds(), 75);
        assert_eq!(meta.error_count, 1);
        assert_eq!(meta.warning_count, 2);
    }

    #[test]
    fn formats_sizes_and_durations() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_duration(chrono::Duration::seconds(7)), "7s");
        assert_eq!(format_duration(chrono::Duration::seconds(125)), "2m 05s");
        assert_eq!(format_duration(chrono::Duration::seconds(3723)), "1h 02m 03s");
    }
}
