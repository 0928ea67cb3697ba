use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::process::ExitCode;

use chrono::Utc;
use futures::FutureExt;
use tracing::{debug, info};

use crate::core::confirm::OperatorPrompt;
use crate::core::destination::{Destination, RemoteConnector};
use crate::core::error::PipelineError;
use crate::core::executor::MigrationExecutor;
use crate::core::inventory::{FolderSource, InventoryCollector};
use crate::core::models::{FolderRecord, MigrationOutcome, RunMetadata};
use crate::core::persist::{PersistOutcome, ReportOpener, ReportPersister};
use crate::core::report::{self, ReportInput};
use crate::core::run_log::RunLog;
use crate::core::summary::InventorySummary;
use crate::core::transfer_engine::TransferEngine;

use crate::context::AppContext;

/// How a run ended when no stage failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed {
        succeeded: usize,
        failed: usize,
        report: PersistOutcome,
    },
    Declined,
}

/// Result of a whole run, including the audit trail.
#[derive(Debug)]
pub struct RunReport {
    pub result: Result<RunOutcome, PipelineError>,
    pub inventory: Vec<FolderRecord>,
    pub outcomes: Vec<MigrationOutcome>,
    pub log: RunLog,
    pub metadata: RunMetadata,
}

impl RunReport {
    /// Completed or declined by the operator.
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// 0 on completion or decline, 1 on any stage failure.
    pub fn exit_code(&self) -> ExitCode {
        if self.succeeded() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

/// The collaborators a run is wired to.
pub struct Collaborators<'a> {
    pub source: &'a dyn FolderSource,
    pub destination: &'a dyn Destination,
    pub engine: &'a dyn TransferEngine,
    pub prompt: &'a mut dyn OperatorPrompt,
    pub opener: &'a dyn ReportOpener,
}

pub struct Orchestrator {
    ctx: AppContext,
}

impl Orchestrator {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Run the full pipeline. The destination disconnect is attempted exactly once, on
    /// every path out of the run, including a panic inside a stage.
    pub async fn run(&self, collab: Collaborators<'_>) -> RunReport {
        let Collaborators {
            source,
            destination,
            engine,
            prompt,
            opener,
        } = collab;

        let mut state = RunState {
            log: RunLog::new(),
            metadata: RunMetadata::open(&self.ctx.config.batch_prefix, Utc::now()),
            inventory: Vec::new(),
            outcomes: Vec::new(),
        };
        state.log.info(format!(
            "Folder migration run {} started (batch {})",
            state.metadata.run_id, state.metadata.batch_label
        ));

        let stages = self.run_stages(&mut state, source, destination, engine, prompt, opener);
        let result = match AssertUnwindSafe(stages).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(PipelineError::Fault(panic_message(payload.as_ref()))),
        };

        if let Err(e) = &result {
            state.log.error(format!("Migration run aborted: {}", e));
        }

        let connector = RemoteConnector::new(destination);
        connector.disconnect(&mut state.log).await;

        match &result {
            Ok(RunOutcome::Completed { succeeded, failed, .. }) => {
                info!(succeeded, failed, "Migration run finished");
            }
            Ok(RunOutcome::Declined) => info!("Migration run declined by operator"),
            Err(_) => debug!("Migration run ended with a failure"),
        }

        RunReport {
            result,
            inventory: state.inventory,
            outcomes: state.outcomes,
            log: state.log,
            metadata: state.metadata,
        }
    }

    async fn run_stages(
        &self,
        state: &mut RunState,
        source: &dyn FolderSource,
        destination: &dyn Destination,
        engine: &dyn TransferEngine,
        prompt: &mut dyn OperatorPrompt,
        opener: &dyn ReportOpener,
    ) -> Result<RunOutcome, PipelineError> {
        let config = &self.ctx.config;

        state.inventory = InventoryCollector::new(source).collect(&mut state.log).await;
        if state.inventory.is_empty() {
            return Err(PipelineError::EmptyInventory);
        }

        let summary = InventorySummary::new(&state.inventory, config.top_n);
        println!("\n{}", summary.render());

        let question = format!(
            "Migrate {} folders ({} items) in batch '{}'?",
            summary.total_folders, summary.total_items, state.metadata.batch_label
        );
        if !prompt.confirm(&question).map_err(PipelineError::Prompt)? {
            state.log.warning("Migration cancelled by operator");
            return Ok(RunOutcome::Declined);
        }
        state.log.info("Operator confirmed migration");

        let org = RemoteConnector::new(destination)
            .connect(&mut state.log)
            .await?;
        state.metadata.organization = Some(org);

        let executor = MigrationExecutor::new(engine, &state.metadata.batch_label);
        state.outcomes = executor.run(&state.inventory, &mut state.log).await;

        let succeeded = state.outcomes.iter().filter(|o| o.is_success()).count();
        let failed = state.outcomes.len() - succeeded;

        state.log.info("Generating migration report");
        let (warnings, errors) = (state.log.warning_count(), state.log.error_count());
        state.metadata.finalize(Utc::now(), errors, warnings);

        let snapshot = state.log.snapshot();
        let document = report::generate(&ReportInput {
            inventory: &state.inventory,
            outcomes: &state.outcomes,
            log: &snapshot,
            metadata: &state.metadata,
        });

        let persister = ReportPersister::new(
            config.report_location(),
            config.fallback_report_dir.clone(),
            config.offer_open_report,
            opener,
        );
        let saved = persister
            .save(
                &document,
                &report::file_name(&state.metadata),
                prompt,
                &mut state.log,
            )
            .map_err(PipelineError::PersistFallbackFailure)?;

        Ok(RunOutcome::Completed {
            succeeded,
            failed,
            report: saved,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

struct RunState {
    log: RunLog,
    metadata: RunMetadata,
    inventory: Vec<FolderRecord>,
    outcomes: Vec<MigrationOutcome>,
}
