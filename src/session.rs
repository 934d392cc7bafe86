use crate::activity::{ActivitySessionController, Session};
use crate::api::CastApi;
use crate::config::SessionConfig;
use crate::error::{CastError, LastError, Result};
use crate::media::{MediaSnapshot, MediaStateTracker};
use crate::pending::PendingOperations;
use crate::receivers::ReceiverDirectory;
use crate::subscription::{Notifier, StateReceiver};
use crate::types::Receiver;
use crate::volume::{self, VolumeControl};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Everything an observer needs to render one frame
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session: Session,
    pub media: MediaSnapshot,
    pub receivers: Vec<Receiver>,
}

/// A cast session bound to one device API handle
///
/// Wires the activity controller, media tracker and receiver directory
/// together and runs the volume binding. Must be created inside a Tokio
/// runtime.
///
/// # Example
///
/// ```no_run
/// # use cast_activity::{CastApi, CastSession, SessionConfig};
/// # use std::sync::Arc;
/// # async fn run(api: Arc<dyn CastApi>) -> Result<(), Box<dyn std::error::Error>> {
/// let session = CastSession::new(api, &SessionConfig::default())?;
/// let mut changes = session.subscribe();
///
/// session.controller().set_application("Foo")?;
/// while let Ok(_change) = changes.recv().await {
///     if let Some(receiver) = session.receivers().receivers().first() {
///         session.controller().launch(receiver.clone())?;
///         break;
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct CastSession {
    controller: ActivitySessionController,
    pending: PendingOperations,
    notifier: Notifier,
    volume: VolumeControl,
    volume_task: JoinHandle<()>,
}

impl CastSession {
    /// Build a session around a device API handle
    pub fn new(api: Arc<dyn CastApi>, config: &SessionConfig) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| CastError::NoRuntime)?;
        let config = config.clone().normalized();

        let notifier = Notifier::new(config.notify_capacity);
        let pending = PendingOperations::new();
        let errors = LastError::new(notifier.clone());
        let media = MediaStateTracker::new(
            api.clone(),
            pending.clone(),
            errors.clone(),
            notifier.clone(),
            config.initial_volume,
        );
        let receivers = ReceiverDirectory::new(notifier.clone());
        let controller = ActivitySessionController::new(
            api,
            pending.clone(),
            media.clone(),
            receivers,
            errors,
            notifier.clone(),
            config.stop_failure,
        );
        controller.set_launch_parameters(config.launch_parameters.clone());

        let (volume, volume_task) = volume::bind(&runtime, media, config.initial_volume);

        if let Some(app_id) = &config.app_id {
            controller.set_application(app_id.clone())?;
        }

        Ok(Self {
            controller,
            pending,
            notifier,
            volume,
            volume_task,
        })
    }

    pub fn controller(&self) -> &ActivitySessionController {
        &self.controller
    }

    pub fn media(&self) -> &MediaStateTracker {
        self.controller.media()
    }

    pub fn receivers(&self) -> &ReceiverDirectory {
        self.controller.receivers()
    }

    /// Continuous volume control; changes are sent while an activity runs
    pub fn volume(&self) -> &VolumeControl {
        &self.volume
    }

    /// Commands still waiting for their result
    pub fn pending(&self) -> &PendingOperations {
        &self.pending
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> StateReceiver {
        self.notifier.subscribe()
    }

    /// Get a consistent snapshot of all observable state
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.controller.session(),
            media: self.media().snapshot(),
            receivers: self.receivers().receivers(),
        }
    }
}

impl Drop for CastSession {
    fn drop(&mut self) {
        self.volume_task.abort();
    }
}
