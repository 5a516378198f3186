//! High-level lifecycle controller for a silence backend.

mod controls;
mod runtime;

use std::fmt::{Display, Formatter};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::backend::{BackendKind, SilenceBackend};

use runtime::RunningFlag;

/// Lifecycle state of a [`Player`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// How a [`Player::stop`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The player was not running; nothing happened.
    NotRunning,
    /// The worker exited within the timeout and was joined.
    Joined,
    /// The worker was still blocked at the timeout and was left behind.
    Abandoned,
}

/// Error type for lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    InvalidState(PlayerState),
    Spawn(String),
}

impl Display for PlayerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidState(state) => {
                write!(f, "player cannot start from the {:?} state", state)
            }
            Self::Spawn(err) => write!(f, "failed to spawn playback worker: {}", err),
        }
    }
}

impl std::error::Error for PlayerError {}

/// Owns the active backend and the worker thread running it.
///
/// `Idle -> Running -> Stopping -> Stopped`. The running flag is raised and
/// lowered only here; the worker gets a read-only view. Dropping the player
/// stops it.
pub struct Player {
    kind: BackendKind,
    state: PlayerState,
    backend: Option<Box<dyn SilenceBackend>>,
    running: RunningFlag,
    worker_alive: Arc<AtomicBool>,
    worker_handle: Option<JoinHandle<()>>,
    stop_timeout: Duration,
}

impl Player {
    /// Wrap `backend`; nothing runs until [`Player::start`].
    ///
    /// # Arguments
    /// * `backend` - The selected backend.
    /// * `stop_timeout` - Longest [`Player::stop`] waits for the worker.
    pub fn new(backend: Box<dyn SilenceBackend>, stop_timeout: Duration) -> Self {
        Self {
            kind: backend.kind(),
            state: PlayerState::Idle,
            backend: Some(backend),
            running: RunningFlag::new(),
            worker_alive: Arc::new(AtomicBool::new(false)),
            worker_handle: None,
            stop_timeout,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.kind
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}
