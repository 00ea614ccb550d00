//! Finite State Machine for the deployment lifecycle

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// FSM settings
#[derive(Debug, Clone)]
pub struct FsmSettings {
    /// Client-side limit on each remote operation. Expiry counts as a
    /// transport failure.
    pub operation_timeout: Duration,
}

impl Default for FsmSettings {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(300),
        }
    }
}

/// Why the lifecycle failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Deploy request failed; the user may submit again
    Submission,

    /// Deployment could not be found; terminal for the current view
    NotFound,
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum LifecycleState {
    /// No deployment yet
    Idle,

    /// Deploy request in flight
    Submitting,

    /// Deployment running, record populated
    Active,

    /// Stop requested, waiting on the user
    StopConfirming,

    /// Stop request in flight
    Stopping,

    /// Deployment stopped
    Stopped,

    /// Something went wrong
    Failed(FailureKind),
}

impl LifecycleState {
    /// States in which a mutating request is outstanding
    pub fn is_pending(&self) -> bool {
        matches!(self, LifecycleState::Submitting | LifecycleState::Stopping)
    }

    /// States in which a deployment record is held
    pub fn has_deployment(&self) -> bool {
        matches!(
            self,
            LifecycleState::Active | LifecycleState::StopConfirming | LifecycleState::Stopping
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Idle => f.write_str("idle"),
            LifecycleState::Submitting => f.write_str("submitting"),
            LifecycleState::Active => f.write_str("active"),
            LifecycleState::StopConfirming => f.write_str("stop confirming"),
            LifecycleState::Stopping => f.write_str("stopping"),
            LifecycleState::Stopped => f.write_str("stopped"),
            LifecycleState::Failed(FailureKind::Submission) => f.write_str("failed"),
            LifecycleState::Failed(FailureKind::NotFound) => f.write_str("not found"),
        }
    }
}

/// Lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Valid repository submitted
    Submit,

    /// Deploy request succeeded
    SubmitSucceeded,

    /// Deploy request failed
    SubmitFailed,

    /// Submission failure shown to the user
    Acknowledge,

    /// Hand-off record adopted or status query succeeded
    Reconciled,

    /// Status query failed
    ReconcileFailed,

    /// User pressed stop
    RequestStop,

    /// User cancelled or escaped the confirmation
    CancelStop,

    /// User confirmed the stop
    ConfirmStop,

    /// Stop request succeeded
    StopSucceeded,

    /// Stop request failed
    StopFailed,

    /// View left; discard everything
    Reset,
}

/// Deployment lifecycle FSM
#[derive(Debug, Clone)]
pub struct LifecycleFsm {
    state: LifecycleState,
}

impl LifecycleFsm {
    /// Create a new FSM in idle state
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Idle,
        }
    }

    /// Get current state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: LifecycleEvent) -> Result<LifecycleState, String> {
        use LifecycleEvent as E;
        use LifecycleState as S;

        let new_state = match (self.state, event) {
            (_, E::Reset) => S::Idle,

            // From Idle
            (S::Idle, E::Submit) => S::Submitting,
            (S::Idle, E::Reconciled) => S::Active,
            (S::Idle, E::ReconcileFailed) => S::Failed(FailureKind::NotFound),

            // From Submitting
            (S::Submitting, E::SubmitSucceeded) => S::Active,
            (S::Submitting, E::SubmitFailed) => S::Failed(FailureKind::Submission),

            // From Failed
            (S::Failed(FailureKind::Submission), E::Acknowledge) => S::Idle,

            // From Active
            (S::Active, E::RequestStop) => S::StopConfirming,

            // From StopConfirming
            (S::StopConfirming, E::CancelStop) => S::Active,
            (S::StopConfirming, E::ConfirmStop) => S::Stopping,

            // From Stopping
            (S::Stopping, E::StopSucceeded) => S::Stopped,
            (S::Stopping, E::StopFailed) => S::Active,

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(new_state)
    }

    /// Check whether an event would be accepted without applying it
    pub fn accepts(&self, event: LifecycleEvent) -> bool {
        self.clone().process(event).is_ok()
    }
}

impl Default for LifecycleFsm {
    fn default() -> Self {
        Self::new()
    }
}
