//! Runtime configuration.
//!
//! Settings come from defaults, an optional JSON file, and finally command
//! line overrides applied by the caller.

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;

const DEFAULT_SAMPLE_RATE: u32 = 44_100;
const DEFAULT_CHUNK_SIZE: usize = 1024;
const DEFAULT_PLAYER_COMMAND: &str = "aplay";
const DEFAULT_PLAYER_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_STOP_TIMEOUT_MS: u64 = 1_000;
/// Enough for a cooperative worker to notice the flag and clean up.
const MIN_STOP_TIMEOUT_MS: u64 = 100;

/// Which backend(s) selection may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BackendPreference {
    /// Try every backend in preference order.
    #[default]
    Auto,
    /// Use exactly this backend or fail.
    Explicit(BackendKind),
}

impl Display for BackendPreference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Explicit(kind) => write!(f, "{}", kind),
        }
    }
}

impl FromStr for BackendPreference {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "auto" => Ok(Self::Auto),
            other => other.parse::<BackendKind>().map(Self::Explicit),
        }
    }
}

impl TryFrom<String> for BackendPreference {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BackendPreference> for String {
    fn from(value: BackendPreference) -> Self {
        value.to_string()
    }
}

/// External player invocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub command: String,
    /// Arguments placed before the staged file path.
    pub args: Vec<String>,
    pub timeout_ms: u64,
    /// Where staged WAV files go; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            command: DEFAULT_PLAYER_COMMAND.to_string(),
            args: Vec::new(),
            timeout_ms: DEFAULT_PLAYER_TIMEOUT_MS,
            temp_dir: None,
        }
    }
}

/// Full configuration for a silence session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceSettings {
    pub backend: BackendPreference,
    pub sample_rate: u32,
    /// Frames per device-stream write.
    pub chunk_size: usize,
    /// Output device name for the device-stream backend.
    pub device: Option<String>,
    pub player: PlayerSettings,
    pub stop_timeout_ms: u64,
}

impl Default for SilenceSettings {
    fn default() -> Self {
        Self {
            backend: BackendPreference::Auto,
            sample_rate: DEFAULT_SAMPLE_RATE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            device: None,
            player: PlayerSettings::default(),
            stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
        }
    }
}

impl SilenceSettings {
    /// Load settings from a JSON file. Missing fields keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_json_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values no backend can work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.sample_rate == 0 {
            return Err(SettingsError::Invalid("sample_rate must be positive".into()));
        }
        if self.chunk_size == 0 {
            return Err(SettingsError::Invalid("chunk_size must be positive".into()));
        }
        // A single device write must finish well inside the one-second stop check.
        if self.chunk_size as u64 * 2 > self.sample_rate as u64 {
            return Err(SettingsError::Invalid(format!(
                "chunk_size must be at most {} frames (half a second at {}Hz)",
                self.sample_rate / 2,
                self.sample_rate
            )));
        }
        if self.player.timeout_ms == 0 {
            return Err(SettingsError::Invalid(
                "player.timeout_ms must be positive".into(),
            ));
        }
        if self.player.command.trim().is_empty() {
            return Err(SettingsError::Invalid("player.command is empty".into()));
        }
        if self.stop_timeout_ms < MIN_STOP_TIMEOUT_MS {
            return Err(SettingsError::Invalid(format!(
                "stop_timeout_ms must be at least {}",
                MIN_STOP_TIMEOUT_MS
            )));
        }
        Ok(())
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

/// Error type for loading settings.
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Parse(err) => write!(f, "invalid settings json: {}", err),
            Self::Invalid(err) => write!(f, "invalid settings: {}", err),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}
