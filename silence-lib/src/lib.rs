//! # Silence Library
//!
//! Keeps an audio output awake by playing digital silence. The library picks
//! one of several output backends, runs it on a worker thread and stops it
//! cooperatively when the host asks.

pub mod audio;
pub mod backend;
pub mod playback;
pub mod selector;
pub mod session;
pub mod settings;
mod tools;

#[cfg(test)]
pub(crate) mod test_support;
