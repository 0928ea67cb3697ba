use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::error::TransferError;
use super::models::FolderRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransferEngineType {
    #[default]
    Http,
    Simulated,
}

#[derive(Debug, Clone, Copy)]
pub struct TransferRequest<'a> {
    pub batch_label: &'a str,
    pub folder: &'a FolderRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResult {
    pub items_migrated: u64,
}

/// Moves one folder's content to the destination.
#[async_trait]
pub trait TransferEngine: Send + Sync {
    async fn transfer(&self, req: TransferRequest<'_>) -> Result<TransferResult, TransferError>;
}
