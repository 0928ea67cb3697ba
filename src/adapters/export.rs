//! Source backed by a JSON inventory export taken from the source mail system.
//!
//! ```json
//! {
//!   "folders": [
//!     { "name": "Sales", "identity": "pf-1", "parent_path": "\\", "mail_enabled": true }
//!   ],
//!   "statistics": {
//!     "pf-1": { "item_count": 120, "total_size": 4096000, "last_modified": "2024-01-02T03:04:05Z" }
//!   }
//! }
//! ```
//!
//! A folder without a statistics entry is reported as a statistics failure for that folder.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::core::error::SourceError;
use crate::core::inventory::{FolderInfo, FolderSource, FolderStatistics};

#[derive(Debug, Deserialize)]
struct ExportDocument {
    folders: Vec<FolderInfo>,
    #[serde(default)]
    statistics: HashMap<String, FolderStatistics>,
}

pub struct ExportSource {
    path: PathBuf,
    statistics: RwLock<HashMap<String, FolderStatistics>>,
}

impl ExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            statistics: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl FolderSource for ExportSource {
    async fn list_folders(&self) -> Result<Vec<FolderInfo>, SourceError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SourceError::Enumeration(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        let doc: ExportDocument = serde_json::from_str(&content).map_err(|e| {
            SourceError::Enumeration(format!("invalid export {}: {}", self.path.display(), e))
        })?;

        debug!(
            path = %self.path.display(),
            folders = doc.folders.len(),
            statistics = doc.statistics.len(),
            "Loaded source export"
        );

        let mut stats = self
            .statistics
            .write()
            .map_err(|_| SourceError::Enumeration("statistics cache poisoned".to_string()))?;
        *stats = doc.statistics;

        Ok(doc.folders)
    }

    async fn folder_statistics(&self, identity: &str) -> Result<FolderStatistics, SourceError> {
        let stats = self.statistics.read().map_err(|_| SourceError::Statistics {
            identity: identity.to_string(),
            reason: "statistics cache poisoned".to_string(),
        })?;

        stats
            .get(identity)
            .cloned()
            .ok_or_else(|| SourceError::Statistics {
                identity: identity.to_string(),
                reason: "no statistics in export".to_string(),
            })
    }
}
