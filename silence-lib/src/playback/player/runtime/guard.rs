//! Liveness guard for the worker thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Keeps `alive` true exactly while the worker holds the guard.
pub(super) struct WorkerGuard {
    alive: Arc<AtomicBool>,
}

impl WorkerGuard {
    /// Mark the worker as alive.
    ///
    /// Created before the thread is spawned so a quick `stop` never sees a
    /// not-yet-started worker as finished.
    pub(super) fn new(alive: Arc<AtomicBool>) -> Self {
        alive.store(true, Ordering::SeqCst);
        Self { alive }
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
