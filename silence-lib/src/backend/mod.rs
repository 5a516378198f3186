//! Output backends that turn silence buffers into audible-path output.
//!
//! Every backend comes in two halves:
//! - a [`BackendProvider`] that answers "is this mechanism usable here?" and
//!   builds the backend,
//! - a [`SilenceBackend`] whose blocking [`SilenceBackend::run`] loop emits
//!   silence until told to stop and releases its resources on the way out.

#[cfg(feature = "device-stream")]
mod cpal_output;
mod device_stream;
mod error;
mod external_process;
mod mixer_library;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::settings::SilenceSettings;

pub use device_stream::{DeviceStreamBackend, DeviceStreamProvider, PcmOutput, PcmOutputOpener};
pub use error::BackendError;
pub use external_process::{ExternalPlayer, ExternalProcessBackend, ExternalProcessProvider};
#[cfg(feature = "mixer-library")]
pub use mixer_library::MixerLibraryBackend;
pub use mixer_library::MixerLibraryProvider;

/// The output mechanisms this crate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    DeviceStream,
    MixerLibrary,
    ExternalProcess,
}

impl BackendKind {
    /// Order tried by automatic selection, most precise first.
    pub const PREFERENCE_ORDER: [BackendKind; 3] = [
        BackendKind::DeviceStream,
        BackendKind::MixerLibrary,
        BackendKind::ExternalProcess,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::DeviceStream => "device-stream",
            Self::MixerLibrary => "mixer-library",
            Self::ExternalProcess => "external-process",
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::PREFERENCE_ORDER
            .into_iter()
            .find(|kind| kind.name() == value)
            .ok_or_else(|| format!("unknown backend `{}`", value))
    }
}

/// Result of a capability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Missing(String),
}

/// A running silence emitter.
///
/// `run` blocks until `should_continue` returns `false` or the backend fails.
/// Owned resources (streams, mixers, child processes, staged files) are
/// released before it returns, whichever way it exits.
pub trait SilenceBackend: Send {
    fn kind(&self) -> BackendKind;

    fn run(&mut self, should_continue: &dyn Fn() -> bool) -> Result<(), BackendError>;
}

/// Factory and capability probe for one backend kind.
pub trait BackendProvider {
    fn kind(&self) -> BackendKind;

    /// Check whether the backend's library, device or tool is present.
    fn probe(&self) -> Availability;

    fn is_available(&self) -> bool {
        self.probe() == Availability::Available
    }

    /// Build the backend. Absence discovered this late is reported as
    /// [`BackendError::Unavailable`].
    fn construct(&self) -> Result<Box<dyn SilenceBackend>, BackendError>;
}

/// Providers for every backend, in preference order, configured from
/// `settings`.
pub fn default_providers(settings: &SilenceSettings) -> Vec<Box<dyn BackendProvider>> {
    vec![
        Box::new(DeviceStreamProvider::new(
            settings.sample_rate,
            settings.chunk_size,
            settings.device.clone(),
        )),
        Box::new(MixerLibraryProvider::new(settings.sample_rate)),
        Box::new(ExternalProcessProvider::new(
            ExternalPlayer::from_settings(&settings.player),
            settings.sample_rate,
            settings.player.temp_dir.clone(),
        )),
    ]
}

/// Names of the output devices the device-stream backend can open.
#[cfg(feature = "device-stream")]
pub fn output_device_names() -> Result<Vec<String>, BackendError> {
    cpal_output::list_output_devices()
}

/// Names of the output devices the device-stream backend can open.
#[cfg(not(feature = "device-stream"))]
pub fn output_device_names() -> Result<Vec<String>, BackendError> {
    Err(BackendError::Unavailable(
        "built without the `device-stream` feature".to_string(),
    ))
}
