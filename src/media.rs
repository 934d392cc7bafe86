use crate::api::{CastApi, MediaCallback};
use crate::error::{CastError, LastError, Result};
use crate::pending::{Action, PendingOperations};
use crate::subscription::{Notifier, StateChange};
use crate::types::{
    ActivityId, MediaPlayRequest, MediaResult, MediaStatus, MediaVolumeRequest, VolumeLevel,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Media state snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSnapshot {
    /// Last status reported by the activity
    pub status: Option<MediaStatus>,

    /// Whether the last reported status exposed a pause capability
    pub has_pause: bool,

    /// Volume level most recently requested from this side
    pub requested_volume: VolumeLevel,
}

struct MediaState {
    /// Activity that media commands are routed to
    activity_id: Option<ActivityId>,
    status: Option<MediaStatus>,
    has_pause: bool,
    requested_volume: VolumeLevel,
}

/// Tracks playback state of the running activity and issues media commands
///
/// Every command is a no-op returning [`CastError::NoActivity`] until the
/// activity controller attaches a launched activity.
#[derive(Clone)]
pub struct MediaStateTracker {
    api: Arc<dyn CastApi>,
    pending: PendingOperations,
    state: Arc<Mutex<MediaState>>,
    errors: LastError,
    notifier: Notifier,
}

impl MediaStateTracker {
    pub(crate) fn new(
        api: Arc<dyn CastApi>,
        pending: PendingOperations,
        errors: LastError,
        notifier: Notifier,
        initial_volume: VolumeLevel,
    ) -> Self {
        Self {
            api,
            pending,
            state: Arc::new(Mutex::new(MediaState {
                activity_id: None,
                status: None,
                has_pause: false,
                requested_volume: initial_volume,
            })),
            errors,
            notifier,
        }
    }

    // ========== Playback ==========

    /// Start or resume playback
    pub fn play(&self) -> Result<()> {
        self.play_from(MediaPlayRequest::default())
    }

    /// Start playback with an explicit request (e.g. a start position)
    pub fn play_from(&self, request: MediaPlayRequest) -> Result<()> {
        let activity_id = self.attached(Action::Play)?;
        let on_result = self.completion(Action::Play, &activity_id);
        self.api.play_media(&activity_id, request, on_result);
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        let activity_id = self.attached(Action::Pause)?;
        let on_result = self.completion(Action::Pause, &activity_id);
        self.api.pause_media(&activity_id, on_result);
        Ok(())
    }

    // ========== Volume and Mute ==========

    /// Mute at the current requested level
    pub fn mute(&self) -> Result<()> {
        let activity_id = self.attached(Action::Mute)?;
        let level = self.lock().requested_volume;
        self.send_volume(Action::Mute, &activity_id, MediaVolumeRequest::new(level, true));
        Ok(())
    }

    /// Unmute at the current requested level
    pub fn unmute(&self) -> Result<()> {
        let activity_id = self.attached(Action::Unmute)?;
        let level = self.lock().requested_volume;
        self.send_volume(Action::Unmute, &activity_id, MediaVolumeRequest::new(level, false));
        Ok(())
    }

    /// Request a new volume level, clamped to 0.0..=1.0; also unmutes
    ///
    /// The tracked volume only changes once the activity reports it.
    pub fn set_volume(&self, level: VolumeLevel) -> Result<()> {
        if !level.is_finite() {
            return Err(CastError::InvalidVolume(level));
        }
        let level = level.clamp(0.0, 1.0);
        let activity_id = self.attached(Action::SetVolume)?;
        self.lock().requested_volume = level;
        self.send_volume(Action::SetVolume, &activity_id, MediaVolumeRequest::new(level, false));
        Ok(())
    }

    /// Record the requested level without sending anything
    ///
    /// Used by the continuous volume control so that a level chosen while
    /// no activity runs is what later mute/unmute commands carry.
    pub(crate) fn remember_volume(&self, level: VolumeLevel) -> Result<VolumeLevel> {
        if !level.is_finite() {
            return Err(CastError::InvalidVolume(level));
        }
        let level = level.clamp(0.0, 1.0);
        self.lock().requested_volume = level;
        Ok(level)
    }

    // ========== Status ==========

    /// Query the activity's media status
    pub fn refresh(&self) -> Result<()> {
        let activity_id = self.attached(Action::GetMediaStatus)?;
        let on_result = self.completion(Action::GetMediaStatus, &activity_id);
        self.api.get_media_status(&activity_id, on_result);
        Ok(())
    }

    /// Get the last reported media status
    pub fn status(&self) -> Option<MediaStatus> {
        self.lock().status.clone()
    }

    /// Get whether the last reported status exposed a pause capability
    pub fn has_pause(&self) -> bool {
        self.lock().has_pause
    }

    /// Get the last requested volume level
    pub fn requested_volume(&self) -> VolumeLevel {
        self.lock().requested_volume
    }

    /// Get the activity media commands are routed to
    pub fn activity_id(&self) -> Option<ActivityId> {
        self.lock().activity_id.clone()
    }

    /// Get a snapshot of the media state for rendering
    pub fn snapshot(&self) -> MediaSnapshot {
        let state = self.lock();
        MediaSnapshot {
            status: state.status.clone(),
            has_pause: state.has_pause,
            requested_volume: state.requested_volume,
        }
    }

    // ========== Activity binding ==========

    /// Route media commands to a newly launched activity
    pub(crate) fn attach(&self, activity_id: ActivityId) {
        tracing::debug!("Media tracker attached to activity {}", activity_id);
        self.lock().activity_id = Some(activity_id);
    }

    /// Stop routing commands and forget the activity's media status
    pub(crate) fn detach(&self) {
        {
            let mut state = self.lock();
            state.activity_id = None;
            state.status = None;
            state.has_pause = false;
        }
        self.notifier.notify(StateChange::Media);
    }

    fn attached(&self, action: Action) -> Result<ActivityId> {
        match self.lock().activity_id.clone() {
            Some(activity_id) => Ok(activity_id),
            None => {
                tracing::debug!("Skipping {}: no active activity", action);
                Err(CastError::NoActivity)
            }
        }
    }

    fn send_volume(&self, action: Action, activity_id: &ActivityId, request: MediaVolumeRequest) {
        tracing::debug!(
            "{} on {}: volume {} muted {}",
            action,
            activity_id,
            request.volume,
            request.muted
        );
        let on_result = self.completion(action, activity_id);
        self.api.set_media_volume(activity_id, request, on_result);
    }

    fn completion(&self, action: Action, activity_id: &ActivityId) -> MediaCallback {
        let tracker = self.clone();
        let issued_for = activity_id.clone();
        self.pending
            .register(action, move |result: MediaResult| {
                tracker.handle_result(action, &issued_for, result)
            })
    }

    fn handle_result(&self, action: Action, issued_for: &ActivityId, result: MediaResult) {
        let current = self.lock().activity_id.clone();
        if current.as_ref() != Some(issued_for) {
            tracing::debug!(
                "Ignoring {} result for activity {} which is no longer attached",
                action,
                issued_for
            );
        } else if let Some(detail) = result.error_message() {
            tracing::warn!("Media {} failed: {}", action, detail);
            self.errors.set(detail);
        } else {
            let mut state = self.lock();
            state.has_pause = result
                .status
                .as_ref()
                .is_some_and(MediaStatus::exposes_pause);
            state.status = result.status;
        }
        self.notifier.notify(StateChange::Media);
    }

    fn lock(&self) -> MutexGuard<'_, MediaState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
