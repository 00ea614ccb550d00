//! Error types for the DockLaunch client

use thiserror::Error;

/// Main error type for the DockLaunch client
#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Request failed ({status}): {detail}")]
    RequestFailed { status: u16, detail: String },

    #[error("Invalid response shape: {0}")]
    InvalidResponseShape(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Coarse classification used when deciding how to surface an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    RequestFailed,
    InvalidResponseShape,
    NotFound,
    Other,
}

impl LauncherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LauncherError::ValidationError(_) => ErrorKind::Validation,
            LauncherError::TransportError(_) => ErrorKind::Transport,
            LauncherError::RequestFailed { .. } => ErrorKind::RequestFailed,
            LauncherError::InvalidResponseShape(_) => ErrorKind::InvalidResponseShape,
            LauncherError::NotFound(_) => ErrorKind::NotFound,
            LauncherError::ConfigError(_)
            | LauncherError::IoError(_)
            | LauncherError::JsonError(_) => ErrorKind::Other,
        }
    }
}

impl From<reqwest::Error> for LauncherError {
    fn from(err: reqwest::Error) -> Self {
        // A body that fails to decode arrived with a response; everything else
        // means no usable response was received.
        if err.is_decode() {
            LauncherError::InvalidResponseShape(err.to_string())
        } else if let Some(status) = err.status() {
            LauncherError::RequestFailed {
                status: status.as_u16(),
                detail: err.to_string(),
            }
        } else {
            LauncherError::TransportError(err.to_string())
        }
    }
}
