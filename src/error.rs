use crate::pending::Action;
use crate::subscription::{Notifier, StateChange};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Result type for cast operations
pub type Result<T> = std::result::Result<T, CastError>;

/// Errors that can occur when driving a cast session
///
/// Failures reported by the remote device are not returned as errors: they
/// are recorded in [`LastError`] for display.
#[derive(Error, Debug)]
pub enum CastError {
    /// No application name has been configured
    #[error("Application name not set")]
    ApplicationNotSet,

    /// An application is already registered; call `reset` first
    #[error("Application already set: {0}")]
    AlreadyConfigured(String),

    /// The command needs a running activity
    #[error("No active activity")]
    NoActivity,

    /// A lifecycle command of this kind is still waiting for its result
    #[error("Operation in progress: {0}")]
    Busy(Action),

    /// Volume level is not a finite number
    #[error("Invalid volume level: {0}")]
    InvalidVolume(f64),

    /// The device API has not been detected yet
    #[error("Cast API not available")]
    ApiUnavailable,

    /// A Tokio runtime is required to bind the volume control
    #[error("No Tokio runtime available")]
    NoRuntime,

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session that fed this receiver has been dropped
    #[error("Session dropped")]
    SessionClosed,

    /// The receiver fell behind and this many notifications were discarded
    #[error("Missed {0} change notifications")]
    MissedChanges(u64),
}

impl CastError {
    /// Whether this error is a rejected precondition (nothing was sent)
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            CastError::ApplicationNotSet
                | CastError::AlreadyConfigured(_)
                | CastError::NoActivity
                | CastError::Busy(_)
                | CastError::InvalidVolume(_)
        )
    }
}

/// Last error reported by the remote device
///
/// Cleared when a new launch is attempted. Both the activity controller and
/// the media tracker report into the same handle.
#[derive(Clone)]
pub struct LastError {
    message: Arc<Mutex<Option<String>>>,
    notifier: Notifier,
}

impl LastError {
    pub(crate) fn new(notifier: Notifier) -> Self {
        Self {
            message: Arc::new(Mutex::new(None)),
            notifier,
        }
    }

    /// Get the current error message, if any
    pub fn get(&self) -> Option<String> {
        self.lock().clone()
    }

    pub(crate) fn set(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("Remote error: {}", message);
        *self.lock() = Some(message);
        self.notifier.notify(StateChange::Error);
    }

    pub(crate) fn clear(&self) {
        let previous = self.lock().take();
        if previous.is_some() {
            self.notifier.notify(StateChange::Error);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.message.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
