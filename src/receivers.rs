use crate::api::ReceiverListener;
use crate::subscription::{Notifier, StateChange};
use crate::types::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct DirectoryState {
    receivers: Vec<Receiver>,
    /// Bumped on reset so listeners registered earlier stop applying updates
    generation: u64,
}

/// Receivers known for the configured application
///
/// The list is replaced wholesale on every discovery update.
#[derive(Clone)]
pub struct ReceiverDirectory {
    state: Arc<Mutex<DirectoryState>>,
    notifier: Notifier,
}

impl ReceiverDirectory {
    pub(crate) fn new(notifier: Notifier) -> Self {
        Self {
            state: Arc::new(Mutex::new(DirectoryState {
                receivers: Vec::new(),
                generation: 0,
            })),
            notifier,
        }
    }

    /// Replace the receiver list with a discovery update
    pub fn on_receiver_update(&self, receivers: Vec<Receiver>) {
        tracing::info!("Got receiver list ({} receivers)", receivers.len());
        self.lock().receivers = receivers;
        self.notifier.notify(StateChange::Receivers);
    }

    /// Get a snapshot of the known receivers, in discovery order
    pub fn receivers(&self) -> Vec<Receiver> {
        self.lock().receivers.clone()
    }

    /// Find a receiver by id
    pub fn get(&self, id: &str) -> Option<Receiver> {
        self.lock()
            .receivers
            .iter()
            .find(|receiver| receiver.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().receivers.is_empty()
    }

    /// Build a listener for the device API bound to the current generation
    pub(crate) fn listener(&self) -> ReceiverListener {
        let generation = self.lock().generation;
        let directory = self.clone();
        Arc::new(move |receivers| {
            if directory.lock().generation != generation {
                tracing::debug!("Ignoring receiver update from a stale listener");
                return;
            }
            directory.on_receiver_update(receivers);
        })
    }

    /// Forget all receivers and disarm existing listeners
    pub(crate) fn reset(&self) {
        {
            let mut state = self.lock();
            state.generation += 1;
            state.receivers.clear();
        }
        self.notifier.notify(StateChange::Receivers);
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> (ReceiverDirectory, crate::subscription::StateReceiver) {
        let notifier = Notifier::new(16);
        let rx = notifier.subscribe();
        (ReceiverDirectory::new(notifier), rx)
    }

    #[test]
    fn test_update_replaces_list() {
        let (directory, mut rx) = directory();
        directory.on_receiver_update(vec![Receiver::new("R1", "One"), Receiver::new("R2", "Two")]);
        directory.on_receiver_update(vec![Receiver::new("R3", "Three")]);

        assert_eq!(directory.len(), 1);
        assert!(directory.get("R1").is_none());
        assert_eq!(directory.get("R3").map(|r| r.name), Some("Three".to_string()));
        assert_eq!(rx.drain(), vec![StateChange::Receivers, StateChange::Receivers]);
    }

    #[test]
    fn test_empty_update_clears() {
        let (directory, _rx) = directory();
        directory.on_receiver_update(vec![Receiver::new("R1", "One")]);
        directory.on_receiver_update(Vec::new());
        assert!(directory.is_empty());
    }

    #[test]
    fn test_reset_disarms_old_listener() {
        let (directory, _rx) = directory();
        let old = directory.listener();
        old(vec![Receiver::new("R1", "One")]);
        assert_eq!(directory.len(), 1);

        directory.reset();
        assert!(directory.is_empty());

        old(vec![Receiver::new("R2", "Two")]);
        assert!(directory.is_empty());

        let current = directory.listener();
        current(vec![Receiver::new("R3", "Three")]);
        assert_eq!(directory.receivers(), vec![Receiver::new("R3", "Three")]);
    }
}
