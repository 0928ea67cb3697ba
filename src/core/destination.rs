use async_trait::async_trait;

use super::error::ConnectError;
use super::models::OrganizationInfo;
use super::run_log::RunLog;

/// Session management for the cloud destination service.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Verify the local client is able to talk to the destination at all.
    fn check_prerequisites(&self) -> Result<(), ConnectError>;

    async fn open_session(&self) -> Result<(), ConnectError>;

    /// Fetch the tenant descriptor. Used as the session liveness check.
    async fn organization(&self) -> Result<OrganizationInfo, ConnectError>;

    async fn disconnect(&self) -> Result<(), ConnectError>;
}

pub struct RemoteConnector<'a> {
    destination: &'a dyn Destination,
}

impl<'a> RemoteConnector<'a> {
    pub fn new(destination: &'a dyn Destination) -> Self {
        Self { destination }
    }

    /// Check prerequisites, open a session and prove it is usable.
    pub async fn connect(&self, log: &mut RunLog) -> Result<OrganizationInfo, ConnectError> {
        if let Err(e) = self.destination.check_prerequisites() {
            log.error(format!("Destination prerequisites not met: {}", e));
            return Err(e);
        }

        log.info("Connecting to destination service");
        if let Err(e) = self.destination.open_session().await {
            log.error(format!("Failed to connect to destination: {}", e));
            return Err(e);
        }

        match self.destination.organization().await {
            Ok(org) => {
                log.success(format!(
                    "Connected to destination organization '{}' ({})",
                    org.display_name, org.id
                ));
                Ok(org)
            }
            Err(e) => {
                let err = match e {
                    ConnectError::Unusable(msg) | ConnectError::Connection(msg) => {
                        ConnectError::Unusable(msg)
                    }
                    other => other,
                };
                log.error(format!("Destination session failed verification: {}", err));
                Err(err)
            }
        }
    }

    /// Best-effort session teardown. Errors are logged and swallowed.
    pub async fn disconnect(&self, log: &mut RunLog) {
        match self.destination.disconnect().await {
            Ok(()) => log.info("Disconnected from destination service"),
            Err(e) => log.warning(format!("Error while disconnecting from destination: {}", e)),
        }
    }
}
