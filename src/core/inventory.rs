use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::error::SourceError;
use super::models::{FolderRecord, Stat};
use super::run_log::RunLog;

/// A folder as listed by the source, before statistics are attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderInfo {
    pub name: String,
    pub identity: String,
    pub parent_path: String,
    #[serde(default)]
    pub has_subfolders: bool,
    #[serde(default)]
    pub mail_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderStatistics {
    pub item_count: u64,
    pub total_size: u64,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

/// The source directory/mail service holding the folders to migrate.
#[async_trait]
pub trait FolderSource: Send + Sync {
    /// List every folder in the hierarchy, recursively, in display order.
    async fn list_folders(&self) -> Result<Vec<FolderInfo>, SourceError>;

    /// Fetch usage statistics for a single folder.
    async fn folder_statistics(&self, identity: &str) -> Result<FolderStatistics, SourceError>;
}

pub struct InventoryCollector<'a> {
    source: &'a dyn FolderSource,
}

impl<'a> InventoryCollector<'a> {
    pub fn new(source: &'a dyn FolderSource) -> Self {
        Self { source }
    }

    /// Build the inventory snapshot.
    ///
    /// A statistics failure keeps the folder with unknown statistics and logs a warning.
    /// An enumeration failure is logged as an error and yields an empty inventory.
    pub async fn collect(&self, log: &mut RunLog) -> Vec<FolderRecord> {
        log.info("Enumerating source folders");

        let folders = match self.source.list_folders().await {
            Ok(folders) => folders,
            Err(e) => {
                log.error(format!("Inventory collection failed: {}", e));
                return Vec::new();
            }
        };

        if folders.is_empty() {
            log.warning("No folders found in source");
            return Vec::new();
        }

        log.info(format!("Found {} folders, collecting statistics", folders.len()));

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(folders.len());

        for folder in folders {
            if !seen.insert(folder.identity.clone()) {
                log.warning(format!(
                    "Skipping duplicate folder identity '{}' ({})",
                    folder.identity, folder.name
                ));
                continue;
            }

            let stats = match self.source.folder_statistics(&folder.identity).await {
                Ok(stats) => {
                    debug!(folder = %folder.name, items = stats.item_count, "Collected statistics");
                    Some(stats)
                }
                Err(e) => {
                    log.warning(format!(
                        "Could not get statistics for folder '{}': {}",
                        folder.name, e
                    ));
                    None
                }
            };

            records.push(into_record(folder, stats));
        }

        log.success(format!("Inventory collected: {} folders", records.len()));
        records
    }
}

fn into_record(folder: FolderInfo, stats: Option<FolderStatistics>) -> FolderRecord {
    let (item_count, total_size, last_modified) = match stats {
        Some(s) => (
            Stat::Known(s.item_count),
            Stat::Known(s.total_size),
            Stat::from(s.last_modified),
        ),
        None => (Stat::Unknown, Stat::Unknown, Stat::Unknown),
    };

    FolderRecord {
        name: folder.name,
        identity: folder.identity,
        parent_path: folder.parent_path,
        item_count,
        total_size,
        last_modified,
        has_subfolders: folder.has_subfolders,
        mail_enabled: folder.mail_enabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::LogLevel;
    use std::collections::HashMap;

    struct FixtureSource {
        folders: Result<Vec<FolderInfo>, String>,
        stats: HashMap<String, FolderStatistics>,
    }

    #[async_trait]
    impl FolderSource for FixtureSource {
        async fn list_folders(&self) -> Result<Vec<FolderInfo>, SourceError> {
            self.folders.clone().map_err(SourceError::Enumeration)
        }

        async fn folder_statistics(&self, identity: &str) -> Result<FolderStatistics, SourceError> {
            self.stats
                .get(identity)
                .cloned()
                .ok_or_else(|| SourceError::Statistics {
                    identity: identity.to_string(),
                    reason: "not found".to_string(),
                })
        }
    }

    fn info(name: &str, identity: &str) -> FolderInfo {
        FolderInfo {
            name: name.to_string(),
            identity: identity.to_string(),
            parent_path: "\\".to_string(),
            has_subfolders: false,
            mail_enabled: false,
        }
    }

    fn stats(items: u64) -> FolderStatistics {
        FolderStatistics {
            item_count: items,
            total_size: items * 100,
            last_modified: None,
        }
    }

    #[tokio::test]
    async fn statistics_failure_keeps_folder_with_unknowns() {
        let source = FixtureSource {
            folders: Ok(vec![info("A", "1"), info("B", "2"), info("C", "3")]),
            stats: HashMap::from([("1".to_string(), stats(10)), ("3".to_string(), stats(5))]),
        };
        let mut log = RunLog::new();

        let records = InventoryCollector::new(&source).collect(&mut log).await;

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].item_count, Stat::Known(10));
        assert!(records[1].item_count.is_unknown());
        assert!(records[1].total_size.is_unknown());
        assert!(records[1].last_modified.is_unknown());
        assert_eq!(records[2].item_count, Stat::Known(5));
        assert_eq!(log.warning_count(), 1);
        assert_eq!(log.error_count(), 0);
    }

    #[tokio::test]
    async fn enumeration_failure_returns_empty_and_logs_error() {
        let source = FixtureSource {
            folders: Err("access denied".to_string()),
            stats: HashMap::new(),
        };
        let mut log = RunLog::new();

        let records = InventoryCollector::new(&source).collect(&mut log).await;

        assert!(records.is_empty());
        assert_eq!(log.error_count(), 1);
        let last = log.snapshot().pop().unwrap();
        assert_eq!(last.level, LogLevel::Error);
        assert!(last.message.contains("access denied"));
    }

    #[tokio::test]
    async fn empty_source_is_not_an_error() {
        let source = FixtureSource {
            folders: Ok(Vec::new()),
            stats: HashMap::new(),
        };
        let mut log = RunLog::new();

        let records = InventoryCollector::new(&source).collect(&mut log).await;

        assert!(records.is_empty());
        assert_eq!(log.error_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_identities_are_dropped() {
        let source = FixtureSource {
            folders: Ok(vec![info("A", "1"), info("A copy", "1"), info("B", "2")]),
            stats: HashMap::from([("1".to_string(), stats(1)), ("2".to_string(), stats(2))]),
        };
        let mut log = RunLog::new();

        let records = InventoryCollector::new(&source).collect(&mut log).await;

        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(log.warning_count(), 1);
    }
}
