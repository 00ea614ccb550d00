//! API models

use serde::{Deserialize, Serialize};

/// Deploy request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRequest {
    pub repo_url: String,
}

/// Deploy response
///
/// Fields are optional on the wire; the client decides whether the shape is
/// acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResponse {
    #[serde(default)]
    pub container_id: Option<String>,
    #[serde(default)]
    pub ngrok_url: Option<String>,
}

/// Status response (same body as a deploy response)
pub type StatusResponse = DeployResponse;

/// Stop request
///
/// The service accepts either a container id or the repository url that
/// produced the deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
}

impl StopRequest {
    pub fn by_container(container_id: impl Into<String>) -> Self {
        Self {
            container_id: Some(container_id.into()),
            repo_url: None,
        }
    }

    pub fn by_repository(repo_url: impl Into<String>) -> Self {
        Self {
            container_id: None,
            repo_url: Some(repo_url.into()),
        }
    }
}

/// Stop response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Error response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorResponse {
    /// Best human-readable detail carried by the body
    pub fn detail(&self) -> Option<&str> {
        let non_blank = |s: &&str| !s.trim().is_empty();
        self.error
            .as_deref()
            .filter(non_blank)
            .or_else(|| self.message.as_deref().filter(non_blank))
    }
}
