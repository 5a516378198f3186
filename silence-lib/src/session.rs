//! Top-level control flow: select, start, idle, stop.

use std::fmt::{Display, Formatter};
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::playback::{Player, PlayerError};
use crate::selector::{BackendSelector, SelectError};
use crate::settings::SilenceSettings;

const IDLE_POLL: Duration = Duration::from_millis(100);

/// Error type for a silence session.
#[derive(Debug)]
pub enum SessionError {
    Select(SelectError),
    Player(PlayerError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Select(err) => write!(f, "{}", err),
            Self::Player(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Select(err) => Some(err),
            Self::Player(err) => Some(err),
        }
    }
}

impl From<SelectError> for SessionError {
    fn from(err: SelectError) -> Self {
        Self::Select(err)
    }
}

impl From<PlayerError> for SessionError {
    fn from(err: PlayerError) -> Self {
        Self::Player(err)
    }
}

/// Play silence until `interrupted` reports `true`.
///
/// A backend that dies early is reported once; the session keeps idling so
/// the caller still exits through the interrupt path.
///
/// # Errors
/// Returns an error if no backend can be selected or the player fails to
/// start. Nothing is running when an error is returned.
pub fn run(
    settings: &SilenceSettings,
    selector: &BackendSelector,
    interrupted: &dyn Fn() -> bool,
) -> Result<(), SessionError> {
    let backend = selector.select(settings.backend)?;
    let mut player = Player::new(backend, settings.stop_timeout());
    player.start()?;

    info!("Starting silence player... Press Ctrl+C to stop.");

    let mut reported = false;
    while !interrupted() {
        if !reported && player.is_finished() {
            warn!(
                "silence playback stopped; {} backend is no longer running",
                player.backend_kind()
            );
            reported = true;
        }
        thread::sleep(IDLE_POLL);
    }

    player.stop();
    Ok(())
}
