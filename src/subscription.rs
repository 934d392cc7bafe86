use crate::error::{CastError, Result};
use tokio::sync::broadcast;

/// Which part of the observable state changed
///
/// Observers treat any change as a signal to re-read state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// Activity identity, status, lifecycle state or control enablement
    Activity,

    /// Media status or pause capability
    Media,

    /// Receiver list
    Receivers,

    /// Error message set or cleared
    Error,
}

/// Sending side of the change notifications
#[derive(Clone)]
pub(crate) struct Notifier {
    tx: broadcast::Sender<StateChange>,
}

impl Notifier {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Emit a change notification; dropped silently when nobody listens
    pub(crate) fn notify(&self, change: StateChange) {
        tracing::trace!("Notify {:?}", change);
        let _ = self.tx.send(change);
    }

    pub(crate) fn subscribe(&self) -> StateReceiver {
        StateReceiver::new(self.tx.subscribe())
    }
}

/// Receiver for state change notifications
pub struct StateReceiver {
    rx: broadcast::Receiver<StateChange>,
}

impl StateReceiver {
    pub(crate) fn new(rx: broadcast::Receiver<StateChange>) -> Self {
        Self { rx }
    }

    /// Receive the next change notification
    ///
    /// Returns [`CastError::SessionClosed`] once the session has been
    /// dropped. A receiver that fell behind gets
    /// [`CastError::MissedChanges`] and then resumes with the oldest
    /// notification still buffered.
    pub async fn recv(&mut self) -> Result<StateChange> {
        use broadcast::error::RecvError;

        match self.rx.recv().await {
            Ok(change) => Ok(change),
            Err(RecvError::Closed) => Err(CastError::SessionClosed),
            Err(RecvError::Lagged(missed)) => Err(missed_changes(missed)),
        }
    }

    /// Try to receive a notification without blocking
    ///
    /// Returns `None` if no notification is available.
    pub fn try_recv(&mut self) -> Result<Option<StateChange>> {
        use broadcast::error::TryRecvError;

        match self.rx.try_recv() {
            Ok(change) => Ok(Some(change)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Closed) => Err(CastError::SessionClosed),
            Err(TryRecvError::Lagged(missed)) => Err(missed_changes(missed)),
        }
    }

    /// Drain every buffered notification
    ///
    /// Skips over notifications lost to lag; stops when the buffer is empty
    /// or the session is gone.
    pub fn drain(&mut self) -> Vec<StateChange> {
        let mut changes = Vec::new();
        loop {
            match self.try_recv() {
                Ok(Some(change)) => changes.push(change),
                Err(CastError::MissedChanges(_)) => continue,
                Ok(None) | Err(_) => break,
            }
        }
        changes
    }
}

fn missed_changes(missed: u64) -> CastError {
    tracing::debug!("State receiver lagged, {} notifications lost", missed);
    CastError::MissedChanges(missed)
}
