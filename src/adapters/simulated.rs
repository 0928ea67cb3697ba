//! Deterministic stand-ins for the source and destination services.
//!
//! Used by `--simulation` runs and by the test suite. Nothing here is random: failures are
//! configured up front by folder name, identity or call position.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::core::destination::Destination;
use crate::core::error::{ConnectError, SourceError, TransferError};
use crate::core::inventory::{FolderInfo, FolderSource, FolderStatistics};
use crate::core::models::OrganizationInfo;
use crate::core::transfer_engine::{TransferEngine, TransferRequest, TransferResult};

/// In-memory source with optional per-folder statistics failures.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSource {
    folders: Vec<FolderInfo>,
    statistics: HashMap<String, FolderStatistics>,
    enumeration_error: Option<String>,
}

impl SimulatedSource {
    pub fn new(folders: Vec<FolderInfo>, statistics: HashMap<String, FolderStatistics>) -> Self {
        Self {
            folders,
            statistics,
            enumeration_error: None,
        }
    }

    /// A source whose folder listing always fails.
    pub fn failing(reason: &str) -> Self {
        Self {
            enumeration_error: Some(reason.to_string()),
            ..Self::default()
        }
    }

    /// A small public folder tree used for simulation runs.
    pub fn sample() -> Self {
        let folders = [
            ("Company", "\\", true, false),
            ("Announcements", "\\Company", false, true),
            ("Policies", "\\Company", false, false),
            ("Sales", "\\", true, true),
            ("EMEA", "\\Sales", true, true),
            ("Leads", "\\Sales\\EMEA", false, false),
            ("Support", "\\", false, true),
            ("Archive", "\\", false, false),
        ];

        let folders: Vec<FolderInfo> = folders
            .iter()
            .enumerate()
            .map(|(i, (name, parent, has_subfolders, mail_enabled))| FolderInfo {
                name: name.to_string(),
                identity: format!("pf-{:04}", i + 1),
                parent_path: parent.to_string(),
                has_subfolders: *has_subfolders,
                mail_enabled: *mail_enabled,
            })
            .collect();

        let base = Utc
            .with_ymd_and_hms(2024, 1, 15, 8, 0, 0)
            .single()
            .unwrap_or_default();
        let statistics = folders
            .iter()
            .enumerate()
            // The archive folder has no statistics to exercise the unknown path.
            .filter(|(_, f)| f.name != "Archive")
            .map(|(i, f)| {
                let items = ((i as u64 + 3) * 37) % 500;
                let stats = FolderStatistics {
                    item_count: items,
                    total_size: items * 48 * 1024,
                    last_modified: Some(base + chrono::Duration::days(i as i64 * 11)),
                };
                (f.identity.clone(), stats)
            })
            .collect();

        Self::new(folders, statistics)
    }
}

#[async_trait]
impl FolderSource for SimulatedSource {
    async fn list_folders(&self) -> Result<Vec<FolderInfo>, SourceError> {
        match &self.enumeration_error {
            Some(reason) => Err(SourceError::Enumeration(reason.clone())),
            None => Ok(self.folders.clone()),
        }
    }

    async fn folder_statistics(&self, identity: &str) -> Result<FolderStatistics, SourceError> {
        self.statistics
            .get(identity)
            .cloned()
            .ok_or_else(|| SourceError::Statistics {
                identity: identity.to_string(),
                reason: "statistics not available".to_string(),
            })
    }
}

/// Which step of the simulated destination should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedFault {
    MissingPrerequisite,
    SessionRefused,
    LivenessFails,
    DisconnectFails,
}

/// Destination double that counts how it was driven.
#[derive(Debug, Default)]
pub struct SimulatedDestination {
    fault: Option<SimulatedFault>,
    connected: AtomicBool,
    sessions_opened: AtomicUsize,
    disconnect_attempts: AtomicUsize,
}

impl SimulatedDestination {
    pub fn with_fault(fault: SimulatedFault) -> Self {
        Self {
            fault: Some(fault),
            ..Self::default()
        }
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn disconnect_attempts(&self) -> usize {
        self.disconnect_attempts.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Destination for SimulatedDestination {
    fn check_prerequisites(&self) -> Result<(), ConnectError> {
        if self.fault == Some(SimulatedFault::MissingPrerequisite) {
            return Err(ConnectError::PrerequisiteMissing(
                "simulated client module not installed".to_string(),
            ));
        }
        Ok(())
    }

    async fn open_session(&self) -> Result<(), ConnectError> {
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        if self.fault == Some(SimulatedFault::SessionRefused) {
            return Err(ConnectError::Connection("simulated login refused".to_string()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn organization(&self) -> Result<OrganizationInfo, ConnectError> {
        if self.fault == Some(SimulatedFault::LivenessFails) || !self.is_connected() {
            return Err(ConnectError::Unusable(
                "organization descriptor unavailable".to_string(),
            ));
        }
        Ok(OrganizationInfo {
            id: "sim-tenant-0001".to_string(),
            display_name: "Simulated Tenant".to_string(),
        })
    }

    async fn disconnect(&self) -> Result<(), ConnectError> {
        self.disconnect_attempts.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        if self.fault == Some(SimulatedFault::DisconnectFails) {
            return Err(ConnectError::Connection("simulated disconnect timeout".to_string()));
        }
        Ok(())
    }
}

/// Transfer engine that "migrates" each folder's known item count.
#[derive(Debug, Default)]
pub struct SimulatedEngine {
    failing_names: HashSet<String>,
    fail_every: Option<usize>,
    calls: AtomicUsize,
    transferred: Mutex<Vec<String>>,
}

impl SimulatedEngine {
    /// Fail the folders with these names.
    pub fn failing_folders<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failing_names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Fail every `n`th transfer (1-based).
    pub fn failing_every(n: usize) -> Self {
        Self {
            fail_every: Some(n.max(1)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Identities of folders that were transferred successfully, in order.
    pub fn transferred(&self) -> Vec<String> {
        self.transferred
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TransferEngine for SimulatedEngine {
    async fn transfer(&self, req: TransferRequest<'_>) -> Result<TransferResult, TransferError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let folder = req.folder;

        let fail_by_position = self.fail_every.is_some_and(|n| call % n == 0);
        if fail_by_position || self.failing_names.contains(&folder.name) {
            return Err(TransferError::Rejected {
                status: 409,
                message: format!("simulated failure migrating '{}'", folder.name),
            });
        }

        if let Ok(mut transferred) = self.transferred.lock() {
            transferred.push(folder.identity.clone());
        }

        Ok(TransferResult {
            items_migrated: folder.item_count.known().copied().unwrap_or(0),
        })
    }
}
