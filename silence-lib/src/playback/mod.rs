//! Playback lifecycle: one backend on one worker thread.

pub mod player;

pub use player::{Player, PlayerError, PlayerState, StopOutcome};
