//! Deployment lifecycle controller
//!
//! Owns the lifecycle state, the current deployment record and the stop
//! confirmation for one deployment-viewing session. The presentation layer
//! reads [`ControllerView`] snapshots and consumes [`ControllerEvent`]s from
//! the channel returned by [`LifecycleController::new`].

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::deploy::fsm::{FsmSettings, LifecycleEvent, LifecycleFsm, LifecycleState};
use crate::errors::{ErrorKind, LauncherError};
use crate::http::deadline;
use crate::http::deployments::DeploymentApi;
use crate::models::deployment::{ConfirmationRequest, DeploymentRecord, DeploymentRequest, Notice};
use crate::validate::is_valid_repository_reference;

pub const INVALID_REPOSITORY_NOTICE: &str = "Please enter a valid GitHub repository URL";
pub const DEPLOY_SUCCESS_NOTICE: &str = "Deployment initiated successfully!";
pub const DEPLOY_FAILURE_NOTICE: &str = "Failed to deploy. Please try again.";
pub const NOT_FOUND_NOTICE: &str = "We couldn't find the deployment you're looking for.";
pub const STOP_SUCCESS_NOTICE: &str = "Deployment stopped successfully";
pub const STOP_FAILURE_NOTICE: &str = "Failed to stop deployment";

/// Where the presentation layer should go next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Open the detail view, passing the record along so no status query is needed
    Deployment {
        container_id: String,
        hand_off: DeploymentRecord,
    },

    /// Back to the entry point
    Home,
}

/// Output of the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    StateChanged {
        from: LifecycleState,
        to: LifecycleState,
    },
    Notice(Notice),
    Navigate(Navigation),
}

/// Snapshot of everything the presentation layer renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerView {
    pub state: LifecycleState,
    pub record: Option<DeploymentRecord>,
    pub confirmation: Option<ConfirmationRequest>,

    /// A remote call is outstanding; triggers are disabled
    pub busy: bool,
}

impl ControllerView {
    pub fn is_confirmation_open(&self) -> bool {
        self.confirmation.is_some_and(|c| c.is_open)
    }
}

struct Session {
    fsm: LifecycleFsm,
    record: Option<DeploymentRecord>,
    confirmation: Option<ConfirmationRequest>,
    in_flight: bool,

    /// Bumped on leave; completions from an older generation are dropped
    generation: u64,
}

/// Lifecycle controller
pub struct LifecycleController {
    api: Arc<dyn DeploymentApi>,
    settings: FsmSettings,
    session: Mutex<Session>,
    events: mpsc::UnboundedSender<ControllerEvent>,
}

impl LifecycleController {
    /// Create a controller and the receiving end of its event channel
    pub fn new(
        api: Arc<dyn DeploymentApi>,
        settings: FsmSettings,
    ) -> (Self, mpsc::UnboundedReceiver<ControllerEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let controller = Self {
            api,
            settings,
            session: Mutex::new(Session {
                fsm: LifecycleFsm::new(),
                record: None,
                confirmation: None,
                in_flight: false,
                generation: 0,
            }),
            events,
        };
        (controller, events_rx)
    }

    /// Current snapshot
    pub fn view(&self) -> ControllerView {
        let session = self.session();
        ControllerView {
            state: session.fsm.state(),
            record: session.record.clone(),
            confirmation: session.confirmation,
            busy: session.in_flight,
        }
    }

    /// Current state
    pub fn state(&self) -> LifecycleState {
        self.session().fsm.state()
    }

    /// Submit a repository for deployment
    ///
    /// Ignored while another operation is in flight or once a deployment is held.
    pub async fn submit(&self, input: &str) -> LifecycleState {
        let request = DeploymentRequest::new(input.trim());

        let generation = {
            let mut session = self.session();
            if session.in_flight || !session.fsm.accepts(LifecycleEvent::Submit) {
                debug!("Submit ignored in state {}", session.fsm.state());
                return session.fsm.state();
            }

            if !is_valid_repository_reference(&request.repository_reference) {
                warn!("Rejected repository reference {:?}", request.repository_reference);
                self.emit(ControllerEvent::Notice(Notice::error(INVALID_REPOSITORY_NOTICE)));
                return session.fsm.state();
            }

            self.transition(&mut session, LifecycleEvent::Submit);
            session.in_flight = true;
            session.generation
        };

        info!("Deploying {}", request.repository_reference);
        let result = self
            .with_timeout(self.api.create(&request.repository_reference))
            .await;

        let mut session = self.session();
        if session.generation != generation {
            debug!("Discarding stale deploy result for {}", request.repository_reference);
            return session.fsm.state();
        }
        session.in_flight = false;

        match result {
            Ok(record) => {
                self.transition(&mut session, LifecycleEvent::SubmitSucceeded);
                session.record = Some(record.clone());
                self.emit(ControllerEvent::Notice(Notice::success(DEPLOY_SUCCESS_NOTICE)));
                self.emit(ControllerEvent::Navigate(Navigation::Deployment {
                    container_id: record.container_id().to_string(),
                    hand_off: record,
                }));
            }
            Err(e) => {
                log_failure("deploy", &e);
                self.transition(&mut session, LifecycleEvent::SubmitFailed);
                self.emit(ControllerEvent::Notice(Notice::error(failure_text(
                    DEPLOY_FAILURE_NOTICE,
                    &e,
                ))));
                self.transition(&mut session, LifecycleEvent::Acknowledge);
            }
        }

        session.fsm.state()
    }

    /// Enter the detail view for `container_id`
    ///
    /// A matching hand-off record is adopted as is. Without one the status is
    /// queried, and any failure ends in `Failed(NotFound)`.
    pub async fn enter(
        &self,
        container_id: &str,
        hand_off: Option<DeploymentRecord>,
    ) -> LifecycleState {
        let generation = {
            let mut session = self.session();
            if session.in_flight {
                debug!("Enter ignored while an operation is in flight");
                return session.fsm.state();
            }

            let already_viewing = session.fsm.state().has_deployment()
                && session
                    .record
                    .as_ref()
                    .is_some_and(|r| r.container_id() == container_id);
            if already_viewing {
                return session.fsm.state();
            }

            if session.fsm.state() != LifecycleState::Idle {
                self.reset(&mut session);
            }

            if let Some(record) = hand_off.filter(|r| r.container_id() == container_id) {
                debug!("Adopting hand-off record for {}", container_id);
                session.record = Some(record);
                self.transition(&mut session, LifecycleEvent::Reconciled);
                return session.fsm.state();
            }

            if container_id.trim().is_empty() {
                warn!("Entered deployment view without a container id");
                self.transition(&mut session, LifecycleEvent::ReconcileFailed);
                self.emit(ControllerEvent::Notice(Notice::error(NOT_FOUND_NOTICE)));
                return session.fsm.state();
            }

            session.in_flight = true;
            session.generation
        };

        debug!("Reconciling deployment {}", container_id);
        let result = self.with_timeout(self.api.get_status(container_id)).await;

        let mut session = self.session();
        if session.generation != generation {
            debug!("Discarding stale status result for {}", container_id);
            return session.fsm.state();
        }
        session.in_flight = false;

        match result {
            Ok(record) => {
                session.record = Some(record);
                self.transition(&mut session, LifecycleEvent::Reconciled);
            }
            Err(e) => {
                log_failure("status", &e);
                self.transition(&mut session, LifecycleEvent::ReconcileFailed);
                self.emit(ControllerEvent::Notice(Notice::error(NOT_FOUND_NOTICE)));
            }
        }

        session.fsm.state()
    }

    /// Open the stop confirmation
    pub fn request_stop(&self) -> LifecycleState {
        let mut session = self.session();
        if session.in_flight || !session.fsm.accepts(LifecycleEvent::RequestStop) {
            debug!("Stop request ignored in state {}", session.fsm.state());
            return session.fsm.state();
        }

        self.transition(&mut session, LifecycleEvent::RequestStop);
        session.confirmation = Some(ConfirmationRequest::stop_deployment());
        session.fsm.state()
    }

    /// Close the stop confirmation without stopping
    pub fn cancel_stop(&self) -> LifecycleState {
        let mut session = self.session();
        if session.in_flight || !session.fsm.accepts(LifecycleEvent::CancelStop) {
            return session.fsm.state();
        }

        self.transition(&mut session, LifecycleEvent::CancelStop);
        session.confirmation = None;
        session.fsm.state()
    }

    /// Escape key on the confirmation; same as cancel
    pub fn escape(&self) -> LifecycleState {
        self.cancel_stop()
    }

    /// Confirm the stop and send it to the service
    pub async fn confirm_stop(&self) -> LifecycleState {
        let (generation, container_id) = {
            let mut session = self.session();
            if session.in_flight || !session.fsm.accepts(LifecycleEvent::ConfirmStop) {
                debug!("Stop confirmation ignored in state {}", session.fsm.state());
                return session.fsm.state();
            }

            let Some(container_id) = session.record.as_ref().map(|r| r.container_id().to_string())
            else {
                error!("Stop confirmed without a deployment record");
                return session.fsm.state();
            };

            self.transition(&mut session, LifecycleEvent::ConfirmStop);
            session.in_flight = true;
            (session.generation, container_id)
        };

        info!("Stopping deployment {}", container_id);
        let result = self.with_timeout(self.api.stop(&container_id)).await;

        let mut session = self.session();
        if session.generation != generation {
            debug!("Discarding stale stop result for {}", container_id);
            return session.fsm.state();
        }
        session.in_flight = false;
        session.confirmation = None;

        match result {
            Ok(message) => {
                info!("Deployment {} stopped: {}", container_id, message);
                self.transition(&mut session, LifecycleEvent::StopSucceeded);
                session.record = None;
                self.emit(ControllerEvent::Notice(Notice::success(STOP_SUCCESS_NOTICE)));
                self.emit(ControllerEvent::Navigate(Navigation::Home));
            }
            Err(e) => {
                log_failure("stop", &e);
                self.transition(&mut session, LifecycleEvent::StopFailed);
                self.emit(ControllerEvent::Notice(Notice::error(failure_text(
                    STOP_FAILURE_NOTICE,
                    &e,
                ))));
            }
        }

        session.fsm.state()
    }

    /// Leave the view. Outstanding results are ignored when they arrive.
    pub fn leave(&self) {
        let mut session = self.session();
        self.reset(&mut session);
    }

    fn reset(&self, session: &mut Session) {
        session.generation += 1;
        session.in_flight = false;
        session.record = None;
        session.confirmation = None;
        if session.fsm.state() != LifecycleState::Idle {
            self.transition(session, LifecycleEvent::Reset);
        }
    }

    fn transition(&self, session: &mut Session, event: LifecycleEvent) {
        let from = session.fsm.state();
        match session.fsm.process(event) {
            Ok(to) => {
                debug!("Lifecycle {} -> {} on {:?}", from, to, event);
                self.emit(ControllerEvent::StateChanged { from, to });
            }
            Err(e) => error!("{}", e),
        }
    }

    fn emit(&self, event: ControllerEvent) {
        if let ControllerEvent::Notice(notice) = &event {
            debug!("Notice ({:?}): {}", notice.kind, notice.text);
        }
        // Nobody listening is fine; state stays readable through view()
        let _ = self.events.send(event);
    }

    async fn with_timeout<T>(
        &self,
        operation: impl Future<Output = Result<T, LauncherError>>,
    ) -> Result<T, LauncherError> {
        deadline::with_timeout(self.settings.operation_timeout, operation).await
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn log_failure(operation: &str, err: &LauncherError) {
    match err.kind() {
        ErrorKind::InvalidResponseShape => {
            error!("{} returned an unexpected response shape: {}", operation, err)
        }
        _ => warn!("{} failed: {}", operation, err),
    }
}

fn failure_text(base: &str, err: &LauncherError) -> String {
    match err {
        LauncherError::RequestFailed { detail, .. } if !detail.is_empty() => {
            format!("{}: {}", base, detail)
        }
        _ => base.to_string(),
    }
}
