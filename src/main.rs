use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pfmig::core::transfer_engine::TransferEngineType;
use pfmig::core::{
    BlockingPrompt, Collaborators, ConfirmationGate, InventoryCollector, InventorySummary,
    Orchestrator, PersistOutcome, RunLog, RunOutcome, SystemOpener,
};
use pfmig::{adapters, config, context, logging};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "pfmig")]
#[command(about = "Operator-supervised public folder migration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./pfmig.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect, confirm, migrate and report
    Run(RunArgs),
    /// Collect the inventory and print its summary only
    Inventory(RunArgs),
    /// Write the default configuration to a file
    InitConfig {
        #[arg(default_value = config::DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
}

#[derive(Args, Serialize)]
struct RunArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    source_export: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    destination_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    transfer_engine: Option<TransferEngineType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    batch_prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    top_n: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    report_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    report_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    skip_report: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    offer_open_report: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    verbose: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    json_logs: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    simulation: Option<bool>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::InitConfig { path } => {
            config::AppConfig::write_default(path)?;
            println!("Wrote default configuration to {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => {
            let config = config::AppConfig::new(cli.config.as_deref(), Some(args))?;
            init_logging(&config);
            run_migration(context::AppContext::new(config)).await
        }
        Commands::Inventory(args) => {
            let config = config::AppConfig::new(cli.config.as_deref(), Some(args))?;
            init_logging(&config);
            run_inventory(context::AppContext::new(config)).await
        }
    }
}

fn init_logging(config: &config::AppConfig) {
    logging::init(logging::LogConfig {
        json: config.json_logs,
        verbose: config.verbose,
    });
}

async fn run_migration(ctx: context::AppContext) -> Result<ExitCode> {
    let source = adapters::get_source(&ctx.config).context("Failed to set up folder source")?;
    let pair = adapters::get_destination(&ctx.config);
    let mut prompt = BlockingPrompt::new(ConfirmationGate::stdio());
    let opener = SystemOpener;

    let report = Orchestrator::new(ctx)
        .run(Collaborators {
            source: source.as_ref(),
            destination: pair.destination.as_ref(),
            engine: pair.engine.as_ref(),
            prompt: &mut prompt,
            opener: &opener,
        })
        .await;

    match &report.result {
        Ok(RunOutcome::Completed {
            succeeded,
            failed,
            report: saved,
        }) => {
            println!("Migration complete: {} succeeded, {} failed", succeeded, failed);
            match saved {
                PersistOutcome::Saved(path) | PersistOutcome::SavedToFallback(path) => {
                    println!("Report: {}", path.display())
                }
                PersistOutcome::Skipped => println!("Report not saved"),
            }
        }
        Ok(RunOutcome::Declined) => println!("Migration cancelled by operator"),
        Err(e) => eprintln!("Migration failed: {}", e),
    }

    Ok(report.exit_code())
}

async fn run_inventory(ctx: context::AppContext) -> Result<ExitCode> {
    let source = adapters::get_source(&ctx.config).context("Failed to set up folder source")?;
    let mut log = RunLog::new();

    let inventory = InventoryCollector::new(source.as_ref()).collect(&mut log).await;
    if inventory.is_empty() {
        eprintln!("No folders found");
        return Ok(ExitCode::FAILURE);
    }

    println!("{}", InventorySummary::new(&inventory, ctx.config.top_n).render());
    Ok(ExitCode::SUCCESS)
}
