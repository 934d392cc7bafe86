//! Recording device API for unit tests

use crate::api::{ActivityCallback, CastApi, MediaCallback, ReceiverListener};
use crate::types::{
    ActivityId, ActivityStatus, LaunchRequest, MediaPlayRequest, MediaResult, MediaVolumeRequest,
    Receiver,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    AddReceiverListener(String),
    Launch(LaunchRequest),
    Stop(ActivityId),
    GetActivityStatus(ActivityId),
    Play(ActivityId, MediaPlayRequest),
    Pause(ActivityId),
    SetVolume(ActivityId, MediaVolumeRequest),
    GetMediaStatus(ActivityId),
}

impl Command {
    fn is_launch(&self) -> bool {
        matches!(self, Command::Launch(_))
    }

    fn is_stop(&self) -> bool {
        matches!(self, Command::Stop(_))
    }
}

#[derive(Default)]
struct MockState {
    commands: Vec<Command>,
    activity: Vec<(Command, ActivityCallback)>,
    media: Vec<(Command, MediaCallback)>,
    listeners: Vec<(String, ReceiverListener)>,
    logs: Vec<String>,
    sync_stop: Option<ActivityStatus>,
}

/// Device API double that records every command and holds completions
/// until a test delivers a result
#[derive(Default)]
pub(crate) struct MockApi {
    state: Mutex<MockState>,
}

impl MockApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver this result from inside every `stop_activity` call
    pub(crate) fn reply_to_stop_synchronously(&self, result: ActivityStatus) {
        self.state.lock().unwrap().sync_stop = Some(result);
    }

    pub(crate) fn commands(&self) -> Vec<Command> {
        self.state.lock().unwrap().commands.clone()
    }

    pub(crate) fn logs(&self) -> Vec<String> {
        self.state.lock().unwrap().logs.clone()
    }

    pub(crate) fn pending_results(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.activity.len() + state.media.len()
    }

    pub(crate) fn complete_launch(&self, result: ActivityStatus) {
        self.complete_activity(Command::is_launch, result);
    }

    pub(crate) fn complete_stop(&self, result: ActivityStatus) {
        self.complete_activity(Command::is_stop, result);
    }

    pub(crate) fn complete_activity_status(&self, result: ActivityStatus) {
        self.complete_activity(
            |command| matches!(command, Command::GetActivityStatus(_)),
            result,
        );
    }

    /// Deliver a result to the oldest outstanding media command
    pub(crate) fn complete_media(&self, result: MediaResult) {
        let callback = {
            let mut state = self.state.lock().unwrap();
            assert!(!state.media.is_empty(), "no media command outstanding");
            state.media.remove(0).1
        };
        callback(result);
    }

    /// Deliver a result to the most recent outstanding media command
    pub(crate) fn complete_latest_media(&self, result: MediaResult) {
        let callback = {
            let mut state = self.state.lock().unwrap();
            state.media.pop().expect("no media command outstanding").1
        };
        callback(result);
    }

    pub(crate) fn push_receivers(&self, receivers: Vec<Receiver>) {
        let listeners: Vec<ReceiverListener> = self
            .state
            .lock()
            .unwrap()
            .listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(receivers.clone());
        }
    }

    fn complete_activity(&self, matches: impl Fn(&Command) -> bool, result: ActivityStatus) {
        let callback = {
            let mut state = self.state.lock().unwrap();
            let index = state
                .activity
                .iter()
                .position(|(command, _)| matches(command))
                .expect("no matching activity command outstanding");
            state.activity.remove(index).1
        };
        callback(result);
    }

    fn record_activity(&self, command: Command, on_result: ActivityCallback) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(command.clone());
        state.activity.push((command, on_result));
    }

    fn record_media(&self, command: Command, on_result: MediaCallback) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(command.clone());
        state.media.push((command, on_result));
    }
}

impl CastApi for MockApi {
    fn add_receiver_listener(&self, app_id: &str, on_update: ReceiverListener) {
        let mut state = self.state.lock().unwrap();
        state
            .commands
            .push(Command::AddReceiverListener(app_id.to_string()));
        state.listeners.push((app_id.to_string(), on_update));
    }

    fn launch(&self, request: LaunchRequest, on_result: ActivityCallback) {
        self.record_activity(Command::Launch(request), on_result);
    }

    fn stop_activity(&self, activity_id: &ActivityId, on_result: ActivityCallback) {
        let sync_stop = {
            let mut state = self.state.lock().unwrap();
            state.commands.push(Command::Stop(activity_id.clone()));
            state.sync_stop.clone()
        };
        match sync_stop {
            Some(result) => on_result(result),
            None => self
                .state
                .lock()
                .unwrap()
                .activity
                .push((Command::Stop(activity_id.clone()), on_result)),
        }
    }

    fn get_activity_status(&self, activity_id: &ActivityId, on_result: ActivityCallback) {
        self.record_activity(Command::GetActivityStatus(activity_id.clone()), on_result);
    }

    fn play_media(
        &self,
        activity_id: &ActivityId,
        request: MediaPlayRequest,
        on_result: MediaCallback,
    ) {
        self.record_media(Command::Play(activity_id.clone(), request), on_result);
    }

    fn pause_media(&self, activity_id: &ActivityId, on_result: MediaCallback) {
        self.record_media(Command::Pause(activity_id.clone()), on_result);
    }

    fn set_media_volume(
        &self,
        activity_id: &ActivityId,
        request: MediaVolumeRequest,
        on_result: MediaCallback,
    ) {
        self.record_media(Command::SetVolume(activity_id.clone(), request), on_result);
    }

    fn get_media_status(&self, activity_id: &ActivityId, on_result: MediaCallback) {
        self.record_media(Command::GetMediaStatus(activity_id.clone()), on_result);
    }

    fn log_message(&self, message: &str) {
        self.state.lock().unwrap().logs.push(message.to_string());
    }
}

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
