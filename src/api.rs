use crate::types::{
    ActivityId, ActivityStatus, LaunchRequest, MediaPlayRequest, MediaResult, MediaVolumeRequest,
    Receiver,
};
use std::sync::Arc;

/// Completion for launch, stop and activity status commands
pub type ActivityCallback = Box<dyn FnOnce(ActivityStatus) + Send + 'static>;

/// Completion for media commands
pub type MediaCallback = Box<dyn FnOnce(MediaResult) + Send + 'static>;

/// Listener invoked with the full receiver list on every discovery update
pub type ReceiverListener = Arc<dyn Fn(Vec<Receiver>) + Send + Sync + 'static>;

/// The underlying device API
///
/// Every command takes a completion that the implementation must invoke
/// exactly once. It may do so synchronously, before the command method
/// returns, or at any later point. Results for different commands may
/// arrive in any order.
pub trait CastApi: Send + Sync {
    /// Register for receiver list updates scoped to an application
    fn add_receiver_listener(&self, app_id: &str, on_update: ReceiverListener);

    /// Launch an application on a receiver
    fn launch(&self, request: LaunchRequest, on_result: ActivityCallback);

    /// Stop a running activity
    fn stop_activity(&self, activity_id: &ActivityId, on_result: ActivityCallback);

    /// Query the status of a running activity
    fn get_activity_status(&self, activity_id: &ActivityId, on_result: ActivityCallback);

    fn play_media(
        &self,
        activity_id: &ActivityId,
        request: MediaPlayRequest,
        on_result: MediaCallback,
    );

    fn pause_media(&self, activity_id: &ActivityId, on_result: MediaCallback);

    /// Set volume level and mute flag in one command
    fn set_media_volume(
        &self,
        activity_id: &ActivityId,
        request: MediaVolumeRequest,
        on_result: MediaCallback,
    );

    fn get_media_status(&self, activity_id: &ActivityId, on_result: MediaCallback);

    /// Write a message to the device API's log
    fn log_message(&self, message: &str) {
        tracing::info!("{}", message);
    }
}
