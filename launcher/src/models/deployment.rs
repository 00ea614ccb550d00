//! Deployment models

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository submitted for deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub repository_reference: String,
}

impl DeploymentRequest {
    pub fn new(repository_reference: impl Into<String>) -> Self {
        Self {
            repository_reference: repository_reference.into(),
        }
    }
}

/// Where a deployment came from
///
/// The status endpoint does not report the source repository, so a record
/// rebuilt from a status query carries `Unknown`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "lowercase")]
pub enum SourceReference {
    Known(String),
    #[default]
    Unknown,
}

impl SourceReference {
    pub fn as_known(&self) -> Option<&str> {
        match self {
            SourceReference::Known(url) => Some(url),
            SourceReference::Unknown => None,
        }
    }
}

impl fmt::Display for SourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceReference::Known(url) => f.write_str(url),
            SourceReference::Unknown => f.write_str("unknown source"),
        }
    }
}

/// A running deployment as seen by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    container_id: String,

    /// Public tunnel URL
    pub public_url: String,

    pub source_reference: SourceReference,
}

impl DeploymentRecord {
    pub fn new(
        container_id: impl Into<String>,
        public_url: impl Into<String>,
        source_reference: SourceReference,
    ) -> Self {
        Self {
            container_id: container_id.into(),
            public_url: public_url.into(),
            source_reference,
        }
    }

    /// Container id assigned by the service. Never changes after creation.
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn with_source(mut self, source_reference: SourceReference) -> Self {
        self.source_reference = source_reference;
        self
    }
}

/// Action waiting on user confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    StopDeployment,
}

/// Confirmation gate in front of a destructive action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub pending_action: PendingAction,
    pub is_open: bool,
}

impl ConfirmationRequest {
    pub fn stop_deployment() -> Self {
        Self {
            pending_action: PendingAction::StopDeployment,
            is_open: true,
        }
    }
}

/// Notice severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A user-facing notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
            at: Utc::now(),
        }
    }
}
