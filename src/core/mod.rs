pub mod confirm;
pub mod destination;
pub mod error;
pub mod executor;
pub mod inventory;
pub mod models;
pub mod orchestrator;
pub mod persist;
pub mod report;
pub mod run_log;
pub mod summary;
pub mod transfer_engine;

pub use confirm::{BlockingPrompt, ConfirmationGate, OperatorPrompt};
pub use destination::{Destination, RemoteConnector};
pub use error::{ConnectError, PersistError, PipelineError, SourceError, TransferError};
pub use executor::MigrationExecutor;
pub use inventory::{FolderInfo, FolderSource, FolderStatistics, InventoryCollector};
pub use models::{
    FolderRecord, FolderState, LogEntry, LogLevel, MigrationOutcome, OrganizationInfo,
    OutcomeStatus, RunMetadata, Stat,
};
pub use orchestrator::{Collaborators, Orchestrator, RunOutcome, RunReport};
pub use persist::{PersistOutcome, ReportLocation, ReportOpener, ReportPersister, SystemOpener};
pub use run_log::RunLog;
pub use summary::InventorySummary;
pub use transfer_engine::{TransferEngine, TransferEngineType, TransferRequest, TransferResult};
