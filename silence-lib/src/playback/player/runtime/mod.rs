//! Worker-thread plumbing for `Player`.
//!
//! - [`RunningFlag`] is the cancellation token shared with the worker.
//! - [`guard`] tracks worker liveness so `stop` can wait with a bound.
//! - [`runner`] runs the backend and logs how it ended.

mod guard;
mod runner;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::backend::SilenceBackend;

use guard::WorkerGuard;

/// Shared stop signal. Only the owner can raise or lower it.
pub(super) struct RunningFlag {
    raised: Arc<AtomicBool>,
}

impl RunningFlag {
    pub(super) fn new() -> Self {
        Self {
            raised: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(super) fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub(super) fn lower(&self) {
        self.raised.store(false, Ordering::SeqCst);
    }

    /// Read-only handle for the worker.
    pub(super) fn view(&self) -> RunningView {
        RunningView {
            raised: self.raised.clone(),
        }
    }
}

/// The worker's read-only side of a [`RunningFlag`].
#[derive(Clone)]
pub(super) struct RunningView {
    raised: Arc<AtomicBool>,
}

impl RunningView {
    pub(super) fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

/// Spawn the worker thread for `backend`.
pub(super) fn spawn_worker(
    backend: Box<dyn SilenceBackend>,
    running: RunningView,
    alive: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    let guard = WorkerGuard::new(alive);
    thread::Builder::new()
        .name(format!("silence-{}", backend.kind()))
        .spawn(move || runner::run_backend(backend, running, guard))
}
