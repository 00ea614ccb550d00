//! Deployment API client

use api_models::models::{DeployRequest, DeployResponse, StatusResponse, StopRequest, StopResponse};
use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::errors::LauncherError;
use crate::http::client::HttpClient;
use crate::models::deployment::{DeploymentRecord, SourceReference};

/// Remote operations the lifecycle controller depends on
///
/// Only `get_status` is safe to retry; `create` may start a duplicate
/// deployment and `stop` carries no idempotency guarantee.
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    /// Start a deployment of the given repository
    async fn create(&self, repository_reference: &str) -> Result<DeploymentRecord, LauncherError>;

    /// Look up a running deployment. The source repository is not reported.
    async fn get_status(&self, container_id: &str) -> Result<DeploymentRecord, LauncherError>;

    /// Stop a deployment, returning the service's confirmation message
    async fn stop(&self, container_id: &str) -> Result<String, LauncherError>;
}

impl HttpClient {
    /// Deploy a repository
    pub async fn create_deployment(
        &self,
        repository_reference: &str,
    ) -> Result<DeploymentRecord, LauncherError> {
        let request = DeployRequest {
            repo_url: repository_reference.to_string(),
        };
        let response: DeployResponse = self.post(&["deploy"], &request).await?;

        let (container_id, public_url) = require_deployment_fields(response, "deploy")?;
        info!("Deployment {} created for {}", container_id, repository_reference);

        Ok(DeploymentRecord::new(
            container_id,
            public_url,
            SourceReference::Known(repository_reference.to_string()),
        ))
    }

    /// Get deployment status
    pub async fn get_deployment_status(
        &self,
        container_id: &str,
    ) -> Result<DeploymentRecord, LauncherError> {
        let response: StatusResponse = match self.get(&["status", container_id]).await {
            Ok(response) => response,
            Err(LauncherError::RequestFailed { status: 404, detail }) => {
                return Err(LauncherError::NotFound(format!("{}: {}", container_id, detail)));
            }
            Err(e) => return Err(e),
        };

        let (reported_id, public_url) = require_deployment_fields(response, "status")?;
        if reported_id != container_id {
            warn!(
                "Status for {} reported container id {}, keeping the requested id",
                container_id, reported_id
            );
        }

        Ok(DeploymentRecord::new(
            container_id,
            public_url,
            SourceReference::Unknown,
        ))
    }

    /// Stop a deployment by container id
    pub async fn stop_deployment(&self, container_id: &str) -> Result<String, LauncherError> {
        self.send_stop(StopRequest::by_container(container_id)).await
    }

    /// Stop whatever deployment the service holds for a repository
    pub async fn stop_deployment_by_repository(
        &self,
        repository_reference: &str,
    ) -> Result<String, LauncherError> {
        self.send_stop(StopRequest::by_repository(repository_reference))
            .await
    }

    async fn send_stop(&self, request: StopRequest) -> Result<String, LauncherError> {
        let response: StopResponse = self.post(&["stop"], &request).await?;

        match response.message {
            Some(message) if !message.trim().is_empty() => Ok(message),
            _ => {
                error!("Stop API returned no confirmation message");
                Err(LauncherError::InvalidResponseShape(
                    "stop response is missing message".to_string(),
                ))
            }
        }
    }
}

#[async_trait]
impl DeploymentApi for HttpClient {
    async fn create(&self, repository_reference: &str) -> Result<DeploymentRecord, LauncherError> {
        self.create_deployment(repository_reference).await
    }

    async fn get_status(&self, container_id: &str) -> Result<DeploymentRecord, LauncherError> {
        self.get_deployment_status(container_id).await
    }

    async fn stop(&self, container_id: &str) -> Result<String, LauncherError> {
        self.stop_deployment(container_id).await
    }
}

fn require_deployment_fields(
    response: DeployResponse,
    operation: &str,
) -> Result<(String, String), LauncherError> {
    let container_id = response.container_id.filter(|s| !s.is_empty());
    let public_url = response.ngrok_url.filter(|s| !s.is_empty());

    match (container_id, public_url) {
        (Some(container_id), Some(public_url)) => Ok((container_id, public_url)),
        (container_id, public_url) => {
            let mut missing = Vec::new();
            if container_id.is_none() {
                missing.push("container_id");
            }
            if public_url.is_none() {
                missing.push("ngrok_url");
            }
            error!(
                "{} response is missing {}; client and service may have drifted",
                operation,
                missing.join(", ")
            );
            Err(LauncherError::InvalidResponseShape(format!(
                "{} response is missing {}",
                operation,
                missing.join(", ")
            )))
        }
    }
}
