use log::{error, info};

use crate::backend::SilenceBackend;

use super::guard::WorkerGuard;
use super::RunningView;

/// Worker body: run the backend until the flag drops or it fails.
///
/// The guard is held for the whole call, including unwinding.
pub(super) fn run_backend(
    mut backend: Box<dyn SilenceBackend>,
    running: RunningView,
    _guard: WorkerGuard,
) {
    let kind = backend.kind();
    let should_continue = move || running.is_raised();

    match backend.run(&should_continue) {
        Ok(()) => info!("{} backend stopped", kind),
        Err(err) => error!("{} backend error: {}", kind, err),
    }
    drop(backend);
}
