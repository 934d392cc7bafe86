use crate::api::{ActivityCallback, CastApi};
use crate::config::StopFailurePolicy;
use crate::error::{CastError, LastError, Result};
use crate::media::MediaStateTracker;
use crate::pending::{Action, PendingOperations};
use crate::receivers::ReceiverDirectory;
use crate::subscription::{Notifier, StateChange};
use crate::types::{ActivityId, ActivityStatus, AppId, LaunchRequest, Receiver};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lifecycle of the remote activity
///
/// ```text
/// Idle --launch--> Launching --ok--> Active --stop--> Stopping --any--> Idle
///        Launching --error--> Idle
///        Active --launch--> Stopping --> Launching   (stop before launch)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityState {
    #[default]
    Idle,
    Launching,
    Active,
    Stopping,
}

/// Session snapshot
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub app_id: Option<AppId>,

    /// Present only while an activity is believed running
    pub activity_id: Option<ActivityId>,

    /// Last status reported by the activity
    pub activity_status: Option<String>,

    /// Last error reported by the device
    pub error_message: Option<String>,

    pub state: ActivityState,
    pub show_receiver_picker: bool,
    pub show_activity_controls: bool,
}

#[derive(Default)]
struct ControllerState {
    app_id: Option<AppId>,
    launch_parameters: Option<String>,
    activity_id: Option<ActivityId>,
    activity_status: Option<String>,
    state: ActivityState,
    show_receiver_picker: bool,
    show_activity_controls: bool,
}

/// Launches, stops and queries the remote activity
///
/// Owns the activity identity and status. A successful launch attaches the
/// [`MediaStateTracker`] to the new activity and refreshes its status; a
/// stop detaches it.
#[derive(Clone)]
pub struct ActivitySessionController {
    api: Arc<dyn CastApi>,
    pending: PendingOperations,
    state: Arc<Mutex<ControllerState>>,
    media: MediaStateTracker,
    receivers: ReceiverDirectory,
    errors: LastError,
    notifier: Notifier,
    stop_failure: StopFailurePolicy,
}

impl ActivitySessionController {
    pub(crate) fn new(
        api: Arc<dyn CastApi>,
        pending: PendingOperations,
        media: MediaStateTracker,
        receivers: ReceiverDirectory,
        errors: LastError,
        notifier: Notifier,
        stop_failure: StopFailurePolicy,
    ) -> Self {
        Self {
            api,
            pending,
            state: Arc::new(Mutex::new(ControllerState::default())),
            media,
            receivers,
            errors,
            notifier,
            stop_failure,
        }
    }

    // ========== Application ==========

    /// Set the application to launch and start listening for receivers
    /// that can run it
    pub fn set_application(&self, app_id: impl Into<AppId>) -> Result<()> {
        let app_id = app_id.into();
        if app_id.is_empty() {
            self.api.log_message("Application name not set.");
            return Err(CastError::ApplicationNotSet);
        }

        {
            let mut state = self.lock();
            if let Some(current) = &state.app_id {
                tracing::warn!("Application {} already set; reset first", current);
                return Err(CastError::AlreadyConfigured(current.clone()));
            }
            state.app_id = Some(app_id.clone());
            state.show_receiver_picker = true;
        }

        tracing::info!("Listening for receivers for {}", app_id);
        self.api
            .add_receiver_listener(&app_id, self.receivers.listener());
        self.notifier.notify(StateChange::Activity);
        Ok(())
    }

    /// Forget the application and its receivers
    ///
    /// A running activity is left alone.
    pub fn reset(&self) {
        {
            let mut state = self.lock();
            state.app_id = None;
            state.show_receiver_picker = false;
        }
        self.receivers.reset();
        self.notifier.notify(StateChange::Activity);
    }

    /// Set the parameters attached to subsequent launch requests
    pub fn set_launch_parameters(&self, parameters: Option<String>) {
        self.lock().launch_parameters = parameters.filter(|p| !p.is_empty());
    }

    // ========== Lifecycle ==========

    /// Launch the application on a receiver
    ///
    /// If an activity is running, it is stopped first and the launch is
    /// issued once the stop result arrives.
    pub fn launch(&self, receiver: Receiver) -> Result<()> {
        let mut state = self.lock();
        let Some(app_id) = state.app_id.clone() else {
            drop(state);
            self.api.log_message("Application name not set");
            return Err(CastError::ApplicationNotSet);
        };

        let current = state.state;
        match current {
            ActivityState::Launching => Err(CastError::Busy(Action::Launch)),
            ActivityState::Stopping => Err(CastError::Busy(Action::Stop)),
            ActivityState::Idle => {
                drop(state);
                self.issue_launch(app_id, receiver);
                Ok(())
            }
            ActivityState::Active => {
                let Some(activity_id) = state.activity_id.clone() else {
                    state.state = ActivityState::Idle;
                    drop(state);
                    self.issue_launch(app_id, receiver);
                    return Ok(());
                };
                state.state = ActivityState::Stopping;
                drop(state);

                tracing::info!(
                    "Stopping activity {} before launching on {}",
                    activity_id,
                    receiver.id
                );
                let controller = self.clone();
                let on_result = self.pending.register(Action::Stop, move |result: ActivityStatus| {
                    if controller.handle_stop(result) {
                        controller.issue_launch(app_id, receiver);
                    } else {
                        tracing::warn!("Launch on {} abandoned: activity still running", receiver.id);
                    }
                });
                self.api.stop_activity(&activity_id, on_result);
                Ok(())
            }
        }
    }

    /// Stop the running activity
    pub fn stop(&self) -> Result<()> {
        let activity_id = {
            let mut state = self.lock();
            let activity_id = state.activity_id.clone().ok_or(CastError::NoActivity)?;
            if state.state == ActivityState::Stopping {
                return Err(CastError::Busy(Action::Stop));
            }
            state.state = ActivityState::Stopping;
            activity_id
        };

        tracing::info!("Stopping activity {}", activity_id);
        let controller = self.clone();
        let on_result = self.pending.register(Action::Stop, move |result: ActivityStatus| {
            controller.handle_stop(result);
        });
        self.api.stop_activity(&activity_id, on_result);
        Ok(())
    }

    /// Query the status of the running activity
    pub fn get_activity_status(&self) -> Result<()> {
        let activity_id = self.lock().activity_id.clone().ok_or(CastError::NoActivity)?;

        let controller = self.clone();
        let issued_for = activity_id.clone();
        let on_result = self
            .pending
            .register(Action::GetActivityStatus, move |result: ActivityStatus| {
                controller.handle_status(&issued_for, result);
            });
        self.api.get_activity_status(&activity_id, on_result);
        Ok(())
    }

    // ========== Accessors ==========

    pub fn app_id(&self) -> Option<AppId> {
        self.lock().app_id.clone()
    }

    pub fn activity_id(&self) -> Option<ActivityId> {
        self.lock().activity_id.clone()
    }

    pub fn activity_status(&self) -> Option<String> {
        self.lock().activity_status.clone()
    }

    pub fn state(&self) -> ActivityState {
        self.lock().state
    }

    pub fn show_receiver_picker(&self) -> bool {
        self.lock().show_receiver_picker
    }

    pub fn show_activity_controls(&self) -> bool {
        self.lock().show_activity_controls
    }

    /// Get the last error reported by the device
    pub fn error_message(&self) -> Option<String> {
        self.errors.get()
    }

    /// Get a snapshot of the session for rendering
    pub fn session(&self) -> Session {
        let error_message = self.errors.get();
        let state = self.lock();
        Session {
            app_id: state.app_id.clone(),
            activity_id: state.activity_id.clone(),
            activity_status: state.activity_status.clone(),
            error_message,
            state: state.state,
            show_receiver_picker: state.show_receiver_picker,
            show_activity_controls: state.show_activity_controls,
        }
    }

    pub fn media(&self) -> &MediaStateTracker {
        &self.media
    }

    pub fn receivers(&self) -> &ReceiverDirectory {
        &self.receivers
    }

    // ========== Result handling ==========

    fn issue_launch(&self, app_id: AppId, receiver: Receiver) {
        let parameters = {
            let mut state = self.lock();
            state.state = ActivityState::Launching;
            state.activity_status = None;
            self.media.detach();
            state.launch_parameters.clone()
        };
        self.errors.clear();
        self.notifier.notify(StateChange::Activity);

        let mut request = LaunchRequest::new(app_id, receiver);
        if let Some(parameters) = parameters {
            request = request.with_parameters(parameters);
        }
        tracing::info!("Launching {} on {}", request.app_id, request.receiver.id);

        let on_result: ActivityCallback = {
            let controller = self.clone();
            self.pending.register(Action::Launch, move |result: ActivityStatus| {
                controller.handle_launch(result);
            })
        };
        self.api.launch(request, on_result);
    }

    fn handle_launch(&self, result: ActivityStatus) {
        let launched = match (result.error_message(), result.activity_id.clone()) {
            (Some(detail), _) => Err(detail),
            (None, None) => Err("Launch result carried no activity id".to_string()),
            (None, Some(activity_id)) => Ok(activity_id),
        };
        let activity_id = match launched {
            Ok(activity_id) => activity_id,
            Err(detail) => {
                self.lock().state = ActivityState::Idle;
                self.errors.set(detail);
                self.notifier.notify(StateChange::Activity);
                return;
            }
        };

        tracing::info!("Activity {} launched: {}", activity_id, result.status);
        {
            let mut state = self.lock();
            state.activity_id = Some(activity_id.clone());
            state.activity_status = Some(result.status);
            state.show_activity_controls = true;
            state.state = ActivityState::Active;
            // Media follows the activity id under the same lock
            self.media.attach(activity_id);
        }
        if let Err(e) = self.media.refresh() {
            tracing::warn!("Media status refresh failed: {}", e);
        }
        self.notifier.notify(StateChange::Activity);
    }

    /// Returns whether local activity tracking was cleared
    fn handle_stop(&self, result: ActivityStatus) -> bool {
        let failure = result.error_message();
        let clear = match &failure {
            None => true,
            Some(_) => self.stop_failure == StopFailurePolicy::ClearActivity,
        };
        if let Some(detail) = failure {
            self.errors.set(detail);
        }

        {
            let mut state = self.lock();
            if clear {
                state.activity_id = None;
                state.show_activity_controls = false;
                state.state = ActivityState::Idle;
                self.media.detach();
            } else {
                state.state = ActivityState::Active;
            }
        }
        self.notifier.notify(StateChange::Activity);
        clear
    }

    fn handle_status(&self, issued_for: &ActivityId, result: ActivityStatus) {
        if let Some(detail) = result.error_message() {
            self.errors.set(detail);
        } else {
            let mut state = self.lock();
            if state.activity_id.as_ref() == Some(issued_for) {
                state.activity_status = Some(result.status);
            } else {
                tracing::debug!("Ignoring status for activity {} which is gone", issued_for);
            }
        }
        self.notifier.notify(StateChange::Activity);
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
