use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a [`FolderSource`](crate::core::inventory::FolderSource).
#[derive(Debug, Error)]
pub enum SourceError {
    /// The folder set could not be listed at all.
    #[error("failed to enumerate source folders: {0}")]
    Enumeration(String),

    /// Statistics for a single folder were unavailable.
    #[error("statistics unavailable for '{identity}': {reason}")]
    Statistics { identity: String, reason: String },
}

/// Failures while establishing or verifying the destination session.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("prerequisite missing: {0}")]
    PrerequisiteMissing(String),

    #[error("connection failed: {0}")]
    Connection(String),

    /// The session opened but the liveness check failed.
    #[error("session unusable: {0}")]
    Unusable(String),
}

/// Failure transferring a single folder.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("destination rejected folder (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("no active destination session")]
    NoSession,
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to choose report location: {0}")]
    Chooser(#[source] std::io::Error),
}

/// Stage-level failures that stop the pipeline with a non-zero exit status.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("prerequisite missing: {0}")]
    PrerequisiteMissing(String),

    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    #[error("connection unusable: {0}")]
    ConnectionUnusable(String),

    #[error("no folders found to migrate")]
    EmptyInventory,

    #[error("failed to save report, fallback also failed: {0}")]
    PersistFallbackFailure(#[source] PersistError),

    #[error("operator prompt failed: {0}")]
    Prompt(#[source] std::io::Error),

    /// A stage panicked. Carries the panic message.
    #[error("unexpected fault: {0}")]
    Fault(String),
}

impl From<ConnectError> for PipelineError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::PrerequisiteMissing(msg) => PipelineError::PrerequisiteMissing(msg),
            ConnectError::Connection(msg) => PipelineError::ConnectionFailure(msg),
            ConnectError::Unusable(msg) => PipelineError::ConnectionUnusable(msg),
        }
    }
}
