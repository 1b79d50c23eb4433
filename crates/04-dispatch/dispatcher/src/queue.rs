use crate::error::PushError;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Bounded FIFO of sigil ids awaiting dispatch.
///
/// The dispatcher owns the receiving half. Producers hold [`PendingSender`]
/// clones and may push from any thread; a push into a full queue fails
/// immediately instead of blocking the tick.
#[derive(Debug)]
pub struct PendingWork {
    tx: Sender<String>,
    rx: Receiver<String>,
    capacity: usize,
}

/// Cloneable producer handle for [`PendingWork`].
#[derive(Clone, Debug)]
pub struct PendingSender {
    tx: Sender<String>,
}

impl PendingSender {
    /// Appends `id` at the tail, failing fast when full.
    pub fn try_push(&self, id: impl Into<String>) -> Result<(), PushError> {
        try_send(&self.tx, id.into())
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

fn try_send(tx: &Sender<String>, id: String) -> Result<(), PushError> {
    tx.try_send(id).map_err(|err| match err {
        TrySendError::Full(id) => PushError::Full(id),
        TrySendError::Disconnected(id) => PushError::Disconnected(id),
    })
}

impl PendingWork {
    /// Creates a queue holding at most `capacity` ids (minimum one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = bounded(capacity);
        Self { tx, rx, capacity }
    }

    pub fn sender(&self) -> PendingSender {
        PendingSender {
            tx: self.tx.clone(),
        }
    }

    pub fn try_push(&self, id: impl Into<String>) -> Result<(), PushError> {
        try_send(&self.tx, id.into())
    }

    /// Pops the oldest id without blocking.
    pub fn pop(&self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Pops up to `max` ids in FIFO order.
    pub fn pop_batch(&self, max: usize) -> Vec<String> {
        self.rx.try_iter().take(max).collect()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
