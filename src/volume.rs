use crate::media::MediaStateTracker;
use crate::types::VolumeLevel;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Continuous volume control bound to the media tracker
///
/// Each change is recorded as the requested level right away and forwarded
/// as a set-volume command by a background task. Changes made before the
/// task wakes up collapse into the latest value.
#[derive(Clone)]
pub struct VolumeControl {
    tx: watch::Sender<VolumeLevel>,
    tracker: MediaStateTracker,
}

impl VolumeControl {
    /// Set the volume level; clamped to 0.0..=1.0, ignored when unchanged
    pub fn set(&self, level: VolumeLevel) {
        let level = match self.tracker.remember_volume(level) {
            Ok(level) => level,
            Err(e) => {
                tracing::warn!("Volume change rejected: {}", e);
                return;
            }
        };
        self.tx.send_if_modified(|current| {
            if *current == level {
                false
            } else {
                *current = level;
                true
            }
        });
    }

    /// Get the most recently set level
    pub fn level(&self) -> VolumeLevel {
        *self.tx.borrow()
    }
}

/// Spawn the task forwarding volume changes to `tracker`
pub(crate) fn bind(
    runtime: &Handle,
    tracker: MediaStateTracker,
    initial: VolumeLevel,
) -> (VolumeControl, JoinHandle<()>) {
    let (tx, mut rx) = watch::channel(initial);

    let forward_to = tracker.clone();
    let handle = runtime.spawn(async move {
        while rx.changed().await.is_ok() {
            let level = *rx.borrow_and_update();
            match forward_to.set_volume(level) {
                Ok(()) => {}
                Err(e) if e.is_precondition() => {
                    tracing::debug!("Volume change to {} not sent: {}", level, e)
                }
                Err(e) => tracing::warn!("Volume change to {} failed: {}", level, e),
            }
        }
        tracing::debug!("Volume control dropped");
    });

    (VolumeControl { tx, tracker }, handle)
}
