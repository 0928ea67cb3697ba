use chrono::Utc;
use tracing::{Instrument, info_span};

use super::models::{FolderRecord, FolderState, MigrationOutcome};
use super::run_log::RunLog;
use super::transfer_engine::{TransferEngine, TransferRequest};

/// Runs a batch of folders through the transfer engine one at a time.
pub struct MigrationExecutor<'a> {
    engine: &'a dyn TransferEngine,
    batch_label: &'a str,
}

impl<'a> MigrationExecutor<'a> {
    pub fn new(engine: &'a dyn TransferEngine, batch_label: &'a str) -> Self {
        Self {
            engine,
            batch_label,
        }
    }

    /// Migrate every folder in order, producing exactly one outcome per folder.
    ///
    /// A failed folder is recorded and the batch moves on.
    pub async fn run(&self, inventory: &[FolderRecord], log: &mut RunLog) -> Vec<MigrationOutcome> {
        log.info(format!(
            "Starting migration batch '{}' with {} folders",
            self.batch_label,
            inventory.len()
        ));

        let total = inventory.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, folder) in inventory.iter().enumerate() {
            let outcome = self.migrate_one(index + 1, total, folder, log).await;
            outcomes.push(outcome);
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - succeeded;
        if failed == 0 {
            log.success(format!("Migration batch complete: {} folders migrated", succeeded));
        } else {
            log.warning(format!(
                "Migration batch complete: {} succeeded, {} failed",
                succeeded, failed
            ));
        }

        outcomes
    }

    async fn migrate_one(
        &self,
        position: usize,
        total: usize,
        folder: &FolderRecord,
        log: &mut RunLog,
    ) -> MigrationOutcome {
        let mut state = FolderState::Pending;
        log.info(format!(
            "[{}/{}] Migrating folder '{}'",
            position,
            total,
            folder.full_path()
        ));
        state = advance(state, FolderState::InProgress);

        let req = TransferRequest {
            batch_label: self.batch_label,
            folder,
        };
        let span = info_span!("transfer", folder = %folder.name, identity = %folder.identity);
        let result = self.engine.transfer(req).instrument(span).await;

        match result {
            Ok(res) => {
                state = advance(state, FolderState::Success);
                log.success(format!(
                    "Folder '{}' migrated ({} items)",
                    folder.name, res.items_migrated
                ));
                debug_assert!(state.is_terminal());
                MigrationOutcome::success(&folder.name, res.items_migrated, Utc::now())
            }
            Err(e) => {
                state = advance(state, FolderState::Failed);
                log.error(format!("Folder '{}' failed to migrate: {}", folder.name, e));
                debug_assert!(state.is_terminal());
                MigrationOutcome::failed(&folder.name, e.to_string(), Utc::now())
            }
        }
    }
}

/// Move a folder to its next state. Terminal states never change.
fn advance(current: FolderState, next: FolderState) -> FolderState {
    match (current, next) {
        (FolderState::Pending, FolderState::InProgress) => next,
        (FolderState::InProgress, FolderState::Success | FolderState::Failed) => next,
        _ => current,
    }
}
