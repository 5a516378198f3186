//! Start/stop transitions for `Player`.

use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::runtime::spawn_worker;
use super::{Player, PlayerError, PlayerState, StopOutcome};

const JOIN_POLL: Duration = Duration::from_millis(10);

impl Player {
    /// Raise the running flag and launch the backend on its worker thread.
    ///
    /// # Errors
    /// Returns [`PlayerError::InvalidState`] unless the player is `Idle`.
    pub fn start(&mut self) -> Result<(), PlayerError> {
        if self.state != PlayerState::Idle {
            return Err(PlayerError::InvalidState(self.state));
        }
        let Some(backend) = self.backend.take() else {
            return Err(PlayerError::InvalidState(self.state));
        };

        self.running.raise();
        match spawn_worker(backend, self.running.view(), self.worker_alive.clone()) {
            Ok(handle) => {
                self.worker_handle = Some(handle);
                self.state = PlayerState::Running;
                info!("Started {} silence player", self.kind);
                Ok(())
            }
            Err(err) => {
                self.running.lower();
                self.state = PlayerState::Stopped;
                Err(PlayerError::Spawn(err.to_string()))
            }
        }
    }

    /// Lower the running flag and wait, bounded, for the worker to exit.
    ///
    /// A no-op unless the player is `Running`. A worker still blocked when
    /// the timeout expires is detached rather than killed; process exit
    /// reclaims whatever it holds.
    pub fn stop(&mut self) -> StopOutcome {
        if self.state != PlayerState::Running {
            return StopOutcome::NotRunning;
        }

        info!("Stopping silence player...");
        self.running.lower();
        self.state = PlayerState::Stopping;

        let deadline = Instant::now() + self.stop_timeout;
        while self.worker_alive.load(Ordering::SeqCst) && Instant::now() < deadline {
            thread::sleep(JOIN_POLL);
        }

        let outcome = if self.worker_alive.load(Ordering::SeqCst) {
            self.worker_handle.take();
            warn!(
                "{} backend still busy after {:?}; abandoning its worker",
                self.kind, self.stop_timeout
            );
            StopOutcome::Abandoned
        } else {
            if let Some(handle) = self.worker_handle.take() {
                if handle.join().is_err() {
                    warn!("{} backend worker panicked", self.kind);
                }
            }
            debug!("{} backend worker joined", self.kind);
            StopOutcome::Joined
        };

        self.state = PlayerState::Stopped;
        info!("Stopped.");
        outcome
    }

    /// Return `true` once a started worker has exited, for any reason.
    pub fn is_finished(&self) -> bool {
        self.state != PlayerState::Idle && !self.worker_alive.load(Ordering::SeqCst)
    }
}
