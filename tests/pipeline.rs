//! End-to-end runs of the migration pipeline against the simulated collaborators.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use pfmig::adapters::{SimulatedDestination, SimulatedEngine, SimulatedFault, SimulatedSource};
use pfmig::config::AppConfig;
use pfmig::context::AppContext;
use pfmig::core::{
    Collaborators, ConfirmationGate, LogLevel, Orchestrator, OutcomeStatus, PersistOutcome,
    PipelineError, ReportOpener, RunOutcome, RunReport, TransferEngine, TransferError,
    TransferRequest, TransferResult,
};
use tempfile::{TempDir, tempdir};

struct NoopOpener;

impl ReportOpener for NoopOpener {
    fn open(&self, _path: &Path) -> std::io::Result<()> {
        Ok(())
    }
}

struct PanickingEngine;

#[async_trait]
impl TransferEngine for PanickingEngine {
    async fn transfer(&self, req: TransferRequest<'_>) -> Result<TransferResult, TransferError> {
        panic!("engine crashed on '{}'", req.folder.name);
    }
}

fn config_in(temp: &TempDir) -> AppConfig {
    AppConfig {
        simulation: true,
        report_path: Some(temp.path().join("report.html")),
        fallback_report_dir: temp.path().join("fallback"),
        offer_open_report: false,
        batch_prefix: "PFTest".to_string(),
        ..AppConfig::default()
    }
}

async fn run_with(
    config: AppConfig,
    source: &SimulatedSource,
    destination: &SimulatedDestination,
    engine: &SimulatedEngine,
    input: &str,
) -> (RunReport, String) {
    let mut prompt = ConfirmationGate::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
    let report = Orchestrator::new(AppContext::new(config))
        .run(Collaborators {
            source,
            destination,
            engine,
            prompt: &mut prompt,
            opener: &NoopOpener,
        })
        .await;
    let output = String::from_utf8(prompt.into_output()).unwrap();
    (report, output)
}

#[tokio::test]
async fn completed_run_migrates_every_folder_and_writes_report() {
    let temp = tempdir().unwrap();
    let source = SimulatedSource::sample();
    let destination = SimulatedDestination::default();
    let engine = SimulatedEngine::failing_folders(["Leads"]);

    let (report, _) = run_with(config_in(&temp), &source, &destination, &engine, "y\n").await;

    let Ok(RunOutcome::Completed {
        succeeded,
        failed,
        report: saved,
    }) = &report.result
    else {
        panic!("expected completed run, got {:?}", report.result);
    };
    assert_eq!(*failed, 1);
    assert_eq!(*succeeded, report.inventory.len() - 1);
    assert!(report.succeeded());

    assert_eq!(report.outcomes.len(), report.inventory.len());
    for (outcome, folder) in report.outcomes.iter().zip(&report.inventory) {
        assert_eq!(outcome.folder_name, folder.name);
    }
    let leads = report.outcomes.iter().find(|o| o.folder_name == "Leads").unwrap();
    assert_eq!(leads.status, OutcomeStatus::Failed);

    let path = temp.path().join("report.html");
    assert_eq!(saved, &PersistOutcome::Saved(path.clone()));
    let html = std::fs::read_to_string(path).unwrap();
    assert_eq!(html.matches("class=\"result-row\"").count(), report.outcomes.len());
    assert_eq!(html.matches("class=\"inventory-row\"").count(), report.inventory.len());
    assert!(html.contains("Simulated Tenant"));

    assert_eq!(destination.sessions_opened(), 1);
    assert_eq!(destination.disconnect_attempts(), 1);
    assert!(report.metadata.end_time.is_some());
    assert!(report.metadata.batch_label.starts_with("PFTest_"));
}

#[tokio::test]
async fn sample_folder_without_statistics_is_kept_as_unknown() {
    let temp = tempdir().unwrap();
    let source = SimulatedSource::sample();
    let destination = SimulatedDestination::default();
    let engine = SimulatedEngine::default();

    let (report, _) = run_with(config_in(&temp), &source, &destination, &engine, "Y\n").await;

    let archive = report.inventory.iter().find(|f| f.name == "Archive").unwrap();
    assert!(archive.item_count.is_unknown());
    assert!(report.log.warning_count() >= 1);
    assert_eq!(engine.calls(), report.inventory.len());
}

#[tokio::test]
async fn declined_run_exits_cleanly_without_connecting() {
    let temp = tempdir().unwrap();
    let source = SimulatedSource::sample();
    let destination = SimulatedDestination::default();
    let engine = SimulatedEngine::default();

    let (report, _) = run_with(config_in(&temp), &source, &destination, &engine, "n\n").await;

    assert!(matches!(report.result, Ok(RunOutcome::Declined)));
    assert!(report.succeeded());
    assert!(report.outcomes.is_empty());
    assert_eq!(destination.sessions_opened(), 0);
    assert_eq!(destination.disconnect_attempts(), 1);
    assert_eq!(engine.calls(), 0);
    assert!(!temp.path().join("report.html").exists());
}

#[tokio::test]
async fn invalid_answers_reprompt_until_yes() {
    let temp = tempdir().unwrap();
    let source = SimulatedSource::sample();
    let destination = SimulatedDestination::default();
    let engine = SimulatedEngine::default();

    let (report, output) = run_with(
        config_in(&temp),
        &source,
        &destination,
        &engine,
        "sure\nok\ny\n",
    )
    .await;

    assert!(matches!(report.result, Ok(RunOutcome::Completed { .. })));
    assert_eq!(output.matches("[Y/N]").count(), 3);
}

#[tokio::test]
async fn empty_inventory_halts_before_prompt_and_connection() {
    let temp = tempdir().unwrap();
    let source = SimulatedSource::new(Vec::new(), HashMap::new());
    let destination = SimulatedDestination::default();
    let engine = SimulatedEngine::default();

    let (report, output) = run_with(config_in(&temp), &source, &destination, &engine, "y\n").await;

    assert!(matches!(report.result, Err(PipelineError::EmptyInventory)));
    assert!(!report.succeeded());
    assert!(output.is_empty());
    assert_eq!(destination.sessions_opened(), 0);
    assert_eq!(destination.disconnect_attempts(), 1);
}

#[tokio::test]
async fn enumeration_failure_is_logged_and_treated_as_empty() {
    let temp = tempdir().unwrap();
    let source = SimulatedSource::failing("directory unreachable");
    let destination = SimulatedDestination::default();
    let engine = SimulatedEngine::default();

    let (report, _) = run_with(config_in(&temp), &source, &destination, &engine, "y\n").await;

    assert!(matches!(report.result, Err(PipelineError::EmptyInventory)));
    assert!(
        report
            .log
            .snapshot()
            .iter()
            .any(|e| e.level == LogLevel::Error && e.message.contains("directory unreachable"))
    );
    assert_eq!(destination.disconnect_attempts(), 1);
}

#[tokio::test]
async fn connection_failures_abort_before_any_transfer() {
    let cases = [
        SimulatedFault::MissingPrerequisite,
        SimulatedFault::SessionRefused,
        SimulatedFault::LivenessFails,
    ];

    for fault in cases {
        let temp = tempdir().unwrap();
        let source = SimulatedSource::sample();
        let destination = SimulatedDestination::with_fault(fault);
        let engine = SimulatedEngine::default();

        let (report, _) =
            run_with(config_in(&temp), &source, &destination, &engine, "y\n").await;

        match (fault, &report.result) {
            (SimulatedFault::MissingPrerequisite, Err(PipelineError::PrerequisiteMissing(_))) => {
                assert_eq!(destination.sessions_opened(), 0);
            }
            (SimulatedFault::SessionRefused, Err(PipelineError::ConnectionFailure(_))) => {}
            (SimulatedFault::LivenessFails, Err(PipelineError::ConnectionUnusable(_))) => {}
            (fault, other) => panic!("unexpected result for {:?}: {:?}", fault, other),
        }
        assert_eq!(engine.calls(), 0, "{:?}", fault);
        assert!(report.outcomes.is_empty());
        assert_eq!(destination.disconnect_attempts(), 1, "{:?}", fault);
    }
}

#[tokio::test]
async fn disconnect_failure_does_not_fail_the_run() {
    let temp = tempdir().unwrap();
    let source = SimulatedSource::sample();
    let destination = SimulatedDestination::with_fault(SimulatedFault::DisconnectFails);
    let engine = SimulatedEngine::default();

    let (report, _) = run_with(config_in(&temp), &source, &destination, &engine, "y\n").await;

    assert!(matches!(report.result, Ok(RunOutcome::Completed { .. })));
    assert_eq!(destination.disconnect_attempts(), 1);
    let last = report.log.snapshot().pop().unwrap();
    assert_eq!(last.level, LogLevel::Warning);
}

#[tokio::test]
async fn unwritable_report_and_fallback_is_fatal() {
    let temp = tempdir().unwrap();
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let config = AppConfig {
        report_path: Some(blocker.join("report.html")),
        fallback_report_dir: blocker.join("fallback"),
        ..config_in(&temp)
    };
    let source = SimulatedSource::sample();
    let destination = SimulatedDestination::default();
    let engine = SimulatedEngine::default();

    let (report, _) = run_with(config, &source, &destination, &engine, "y\n").await;

    assert!(matches!(
        report.result,
        Err(PipelineError::PersistFallbackFailure(_))
    ));
    assert_eq!(report.outcomes.len(), report.inventory.len());
    assert_eq!(destination.disconnect_attempts(), 1);
}

#[tokio::test]
async fn skipped_report_still_completes() {
    let temp = tempdir().unwrap();
    let config = AppConfig {
        skip_report: true,
        ..config_in(&temp)
    };
    let source = SimulatedSource::sample();
    let destination = SimulatedDestination::default();
    let engine = SimulatedEngine::default();

    let (report, _) = run_with(config, &source, &destination, &engine, "y\n").await;

    assert!(matches!(
        report.result,
        Ok(RunOutcome::Completed {
            report: PersistOutcome::Skipped,
            ..
        })
    ));
    assert!(!temp.path().join("report.html").exists());
}

#[tokio::test]
async fn log_is_chronological() {
    let temp = tempdir().unwrap();
    let source = SimulatedSource::sample();
    let destination = SimulatedDestination::default();
    let engine = SimulatedEngine::failing_every(2);

    let (report, _) = run_with(config_in(&temp), &source, &destination, &engine, "y\n").await;

    let entries = report.log.snapshot();
    assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(report.log.error_count(), report.outcomes.iter().filter(|o| !o.is_success()).count());
}

#[tokio::test]
async fn panicking_engine_still_disconnects_once() {
    let temp = tempdir().unwrap();
    let source = SimulatedSource::sample();
    let destination = SimulatedDestination::default();
    let mut prompt = ConfirmationGate::new(Cursor::new(b"y\n".to_vec()), Vec::new());

    let report = Orchestrator::new(AppContext::new(config_in(&temp)))
        .run(Collaborators {
            source: &source,
            destination: &destination,
            engine: &PanickingEngine,
            prompt: &mut prompt,
            opener: &NoopOpener,
        })
        .await;

    let Err(PipelineError::Fault(message)) = &report.result else {
        panic!("expected fault, got {:?}", report.result);
    };
    assert!(message.contains("engine crashed"));
    assert!(!report.succeeded());
    assert_eq!(destination.sessions_opened(), 1);
    assert_eq!(destination.disconnect_attempts(), 1);
    assert!(
        report
            .log
            .snapshot()
            .iter()
            .any(|e| e.level == LogLevel::Error && e.message.contains("engine crashed"))
    );
    assert!(!temp.path().join("report.html").exists());
}
