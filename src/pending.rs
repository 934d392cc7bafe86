use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Pending operation identifier
pub type OperationId = Uuid;

/// Commands that produce exactly one asynchronous result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Stop,
    Launch,
    GetActivityStatus,
    Play,
    Pause,
    Mute,
    Unmute,
    SetVolume,
    GetMediaStatus,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Launch => "launch",
            Self::GetActivityStatus => "get-activity-status",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Mute => "mute",
            Self::Unmute => "unmute",
            Self::SetVolume => "set-volume",
            Self::GetMediaStatus => "get-media-status",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry of issued commands still waiting for their result
///
/// Each registration yields a one-shot completion bound to the handler of
/// the call site that issued the command. The device API delivers exactly
/// one result per call, so there is no timeout or cancellation here.
#[derive(Clone, Default)]
pub struct PendingOperations {
    operations: Arc<Mutex<HashMap<OperationId, Action>>>,
}

impl PendingOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pending operation and return the completion to hand to the
    /// device API
    pub fn register<R, F>(&self, action: Action, handler: F) -> Box<dyn FnOnce(R) + Send + 'static>
    where
        R: 'static,
        F: FnOnce(R) + Send + 'static,
    {
        let id = Uuid::new_v4();
        lock(&self.operations).insert(id, action);
        tracing::debug!("Pending {} ({})", action, id);

        let entry = Entry {
            id,
            operations: self.operations.clone(),
        };
        Box::new(move |result| {
            // Guard is released before the handler runs; handlers issue new commands.
            match entry.take() {
                Some(action) => {
                    tracing::debug!("Completed {} ({})", action, id);
                    handler(result);
                }
                None => tracing::warn!("Dropping result for unknown operation {}", id),
            }
        })
    }

    /// Number of operations waiting for a result
    pub fn len(&self) -> usize {
        lock(&self.operations).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.operations).is_empty()
    }

    /// Number of pending operations of one kind
    pub fn count(&self, action: Action) -> usize {
        lock(&self.operations)
            .values()
            .filter(|pending| **pending == action)
            .count()
    }

    pub fn contains(&self, action: Action) -> bool {
        self.count(action) > 0
    }

    /// Kinds of all pending operations, in no particular order
    pub fn actions(&self) -> Vec<Action> {
        lock(&self.operations).values().copied().collect()
    }
}

/// Registry slot owned by a completion; freed when the completion is
/// called or dropped
struct Entry {
    id: OperationId,
    operations: Arc<Mutex<HashMap<OperationId, Action>>>,
}

impl Entry {
    fn take(self) -> Option<Action> {
        // Bound first so the guard is gone before `drop` locks again
        let action = lock(&self.operations).remove(&self.id);
        action
    }
}

impl Drop for Entry {
    fn drop(&mut self) {
        if let Some(action) = lock(&self.operations).remove(&self.id) {
            tracing::debug!("{} ({}) dropped without a result", action, self.id);
        }
    }
}

fn lock(
    operations: &Mutex<HashMap<OperationId, Action>>,
) -> MutexGuard<'_, HashMap<OperationId, Action>> {
    operations.lock().unwrap_or_else(PoisonError::into_inner)
}
