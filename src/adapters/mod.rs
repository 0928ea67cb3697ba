use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::config::AppConfig;
use crate::core::destination::Destination;
use crate::core::error::ConnectError;
use crate::core::inventory::FolderSource;
use crate::core::models::OrganizationInfo;
use crate::core::transfer_engine::{TransferEngine, TransferEngineType};

pub mod export;
pub mod http;
pub mod simulated;

pub use export::ExportSource;
pub use http::HttpDestination;
pub use simulated::{SimulatedDestination, SimulatedEngine, SimulatedFault, SimulatedSource};

/// Destination session plus the engine that will move folders into it.
pub struct DestinationPair {
    pub destination: Arc<dyn Destination>,
    pub engine: Arc<dyn TransferEngine>,
}

pub fn get_source(config: &AppConfig) -> Result<Box<dyn FolderSource>> {
    if config.simulation {
        return Ok(Box::new(SimulatedSource::sample()));
    }

    match &config.source_export {
        Some(path) => Ok(Box::new(ExportSource::new(path.clone()))),
        None => bail!("No source configured: set source_export or use --simulation"),
    }
}

pub fn get_destination(config: &AppConfig) -> DestinationPair {
    if config.simulation {
        return DestinationPair {
            destination: Arc::new(SimulatedDestination::default()),
            engine: Arc::new(SimulatedEngine::default()),
        };
    }

    let timeout = Duration::from_secs(config.request_timeout_secs);
    match HttpDestination::new(config.destination_url.clone(), config.api_token.clone(), timeout) {
        Ok(http) => {
            let http = Arc::new(http);
            let engine: Arc<dyn TransferEngine> = match config.transfer_engine {
                TransferEngineType::Http => http.clone() as Arc<dyn TransferEngine>,
                TransferEngineType::Simulated => Arc::new(SimulatedEngine::default()),
            };
            DestinationPair {
                destination: http,
                engine,
            }
        }
        // Surface the client failure through the connector's prerequisite check.
        Err(e) => DestinationPair {
            destination: Arc::new(UnavailableDestination(e.to_string())),
            engine: Arc::new(SimulatedEngine::default()),
        },
    }
}

/// Destination whose client could not be constructed.
struct UnavailableDestination(String);

#[async_trait]
impl Destination for UnavailableDestination {
    fn check_prerequisites(&self) -> Result<(), ConnectError> {
        Err(ConnectError::PrerequisiteMissing(self.0.clone()))
    }

    async fn open_session(&self) -> Result<(), ConnectError> {
        self.check_prerequisites()
    }

    async fn organization(&self) -> Result<OrganizationInfo, ConnectError> {
        Err(ConnectError::Unusable(self.0.clone()))
    }

    async fn disconnect(&self) -> Result<(), ConnectError> {
        Ok(())
    }
}
