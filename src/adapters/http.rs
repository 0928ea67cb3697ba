//! REST client for the cloud destination service.
//!
//! One `HttpDestination` serves both as the session [`Destination`] and as the
//! [`TransferEngine`] for the batch, sharing the session id between the two roles.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::core::destination::Destination;
use crate::core::error::{ConnectError, TransferError};
use crate::core::models::OrganizationInfo;
use crate::core::transfer_engine::{TransferEngine, TransferRequest, TransferResult};

const SESSION_HEADER: &str = "X-Session-Id";

#[derive(Debug, Deserialize)]
struct SessionResponse {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct FolderTransferRequest<'a> {
    identity: &'a str,
    name: &'a str,
    parent_path: &'a str,
}

#[derive(Debug, Deserialize)]
struct FolderTransferResponse {
    items_migrated: u64,
}

pub struct HttpDestination {
    base_url: Option<String>,
    api_token: Option<String>,
    client: Client,
    session: RwLock<Option<String>>,
}

impl HttpDestination {
    pub fn new(
        base_url: Option<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConnectError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectError::PrerequisiteMissing(format!("HTTP client unavailable: {}", e)))?;

        Ok(Self {
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            api_token,
            client,
            session: RwLock::new(None),
        })
    }

    /// Append `segments` to the base URL. Each segment is percent-encoded, so labels and
    /// session ids can never change the shape of the path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ConnectError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| ConnectError::PrerequisiteMissing("destination URL not configured".to_string()))?;
        let mut url = Url::parse(base)
            .map_err(|e| ConnectError::PrerequisiteMissing(format!("invalid destination URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                ConnectError::PrerequisiteMissing(format!("destination URL cannot be a base: {}", base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn token(&self) -> Result<&str, ConnectError> {
        self.api_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConnectError::PrerequisiteMissing("API token not configured".to_string()))
    }

    async fn session_id(&self) -> Option<String> {
        self.session.read().await.clone()
    }
}

#[async_trait]
impl Destination for HttpDestination {
    fn check_prerequisites(&self) -> Result<(), ConnectError> {
        self.token()?;
        self.endpoint(&["v1", "sessions"])?;
        Ok(())
    }

    async fn open_session(&self) -> Result<(), ConnectError> {
        let url = self.endpoint(&["v1", "sessions"])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(self.token()?)
            .send()
            .await
            .map_err(|e| ConnectError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectError::Connection(format!(
                "session request returned {}: {}",
                status,
                body.trim()
            )));
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| ConnectError::Connection(format!("invalid session response: {}", e)))?;

        debug!(session_id = %session.session_id, "Destination session opened");
        *self.session.write().await = Some(session.session_id);
        Ok(())
    }

    async fn organization(&self) -> Result<OrganizationInfo, ConnectError> {
        let session = self
            .session_id()
            .await
            .ok_or_else(|| ConnectError::Unusable("no session".to_string()))?;
        let url = self.endpoint(&["v1", "organization"])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(self.token()?)
            .header(SESSION_HEADER, session)
            .send()
            .await
            .map_err(|e| ConnectError::Unusable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectError::Unusable(format!(
                "organization request returned {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ConnectError::Unusable(format!("invalid organization response: {}", e)))
    }

    async fn disconnect(&self) -> Result<(), ConnectError> {
        let Some(session) = self.session.write().await.take() else {
            return Ok(());
        };
        let url = self.endpoint(&["v1", "sessions", session.as_str()])?;

        let response = self
            .client
            .delete(url)
            .bearer_auth(self.token()?)
            .send()
            .await
            .map_err(|e| ConnectError::Connection(e.to_string()))?;

        match response.status() {
            s if s.is_success() || s == StatusCode::NOT_FOUND => Ok(()),
            s => Err(ConnectError::Connection(format!("session close returned {}", s))),
        }
    }
}

#[async_trait]
impl TransferEngine for HttpDestination {
    async fn transfer(&self, req: TransferRequest<'_>) -> Result<TransferResult, TransferError> {
        let session = self.session_id().await.ok_or(TransferError::NoSession)?;
        let url = self
            .endpoint(&["v1", "batches", req.batch_label, "folders"])
            .map_err(|e| TransferError::Transport(e.to_string()))?;
        let token = self
            .token()
            .map_err(|e| TransferError::Transport(e.to_string()))?;

        let body = FolderTransferRequest {
            identity: &req.folder.identity,
            name: &req.folder.name,
            parent_path: &req.folder.parent_path,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(SESSION_HEADER, session)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransferError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransferError::Rejected {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        let result: FolderTransferResponse = response
            .json()
            .await
            .map_err(|e| TransferError::Transport(format!("invalid transfer response: {}", e)))?;

        Ok(TransferResult {
            items_migrated: result.items_migrated,
        })
    }
}
