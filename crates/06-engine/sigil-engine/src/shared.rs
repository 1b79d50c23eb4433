use crate::engine::{Engine, EngineSnapshot, EngineTick};
use dispatcher::{PendingSender, PushError};
use parking_lot::{Mutex, MutexGuard};
use sigil_audit::ReinforcementReport;
use std::sync::Arc;

/// Cloneable handle that serialises ticks and reinforcement passes behind one lock.
///
/// Producers push through a [`PendingSender`] captured at construction, so
/// enqueueing never contends with a running tick.
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
    sender: PendingSender,
}

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        let sender = engine.pending_sender();
        Self {
            inner: Arc::new(Mutex::new(engine)),
            sender,
        }
    }

    /// Pushes `id` onto the pending queue without taking the engine lock.
    pub fn enqueue(&self, id: impl Into<String>) -> Result<(), PushError> {
        self.sender.try_push(id)
    }

    pub fn sender(&self) -> PendingSender {
        self.sender.clone()
    }

    pub fn tick(&self) -> EngineTick {
        self.inner.lock().tick()
    }

    pub fn reinforce(&self) -> ReinforcementReport {
        self.inner.lock().reinforce()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.inner.lock().snapshot()
    }

    /// Runs `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    pub fn lock(&self) -> MutexGuard<'_, Engine> {
        self.inner.lock()
    }
}
