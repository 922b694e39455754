use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Cooperative stop request shared between a process and whoever may ask it
/// to pause: an engine handle, another thread, or a listener reacting to a
/// notification.
///
/// The flag is only read at decision boundaries, never in the middle of
/// evaluating a single flow.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    requested: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// A fresh signal carrying the current request state but sharing nothing.
    pub fn detached(&self) -> Self {
        Self {
            requested: Arc::new(AtomicBool::new(self.is_requested())),
        }
    }
}
