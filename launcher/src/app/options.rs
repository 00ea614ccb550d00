//! Application configuration options

use std::time::Duration;

use crate::deploy::fsm::FsmSettings;
use crate::storage::settings::Settings;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Deployment API base URL
    pub backend_base_url: String,

    /// Transport-level timeout for each HTTP request
    pub request_timeout: Duration,

    /// Skip the stop confirmation prompt
    pub assume_yes: bool,

    /// Lifecycle controller settings
    pub fsm_settings: FsmSettings,
}

impl AppOptions {
    /// Build options from a settings file
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            backend_base_url: settings.backend.base_url.clone(),
            request_timeout: settings.backend.request_timeout(),
            assume_yes: false,
            fsm_settings: FsmSettings {
                operation_timeout: settings.controller.operation_timeout(),
            },
        }
    }
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Deploy a repository and show the resulting deployment
    Deploy { repository: String },

    /// Show a deployment
    Status { container_id: String },

    /// Stop a deployment after confirmation
    Stop { container_id: String },

    /// Stop the deployment the service holds for a repository
    StopRepository { repository: String },
}
