//! Backend selection with ordered fallback.

use std::fmt::{Display, Formatter};

use log::{info, warn};

use crate::backend::{
    default_providers, Availability, BackendError, BackendKind, BackendProvider, SilenceBackend,
};
use crate::settings::{BackendPreference, SilenceSettings};

/// Error type for backend selection.
#[derive(Debug)]
pub enum SelectError {
    /// Automatic selection exhausted every candidate.
    NoBackendAvailable { skipped: Vec<(BackendKind, String)> },
    /// The explicitly requested backend is absent.
    Unavailable { kind: BackendKind, reason: String },
    /// Construction failed for a reason other than absence.
    Construction {
        kind: BackendKind,
        source: BackendError,
    },
}

impl Display for SelectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoBackendAvailable { skipped } => {
                write!(f, "no audio backend available")?;
                for (kind, reason) in skipped {
                    write!(f, "; {}: {}", kind, reason)?;
                }
                Ok(())
            }
            Self::Unavailable { kind, reason } => {
                write!(f, "backend {} not available: {}", kind, reason)
            }
            Self::Construction { kind, source } => {
                write!(f, "backend {} failed to start: {}", kind, source)
            }
        }
    }
}

impl std::error::Error for SelectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Construction { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result of trying a single provider.
enum Attempt {
    Built(Box<dyn SilenceBackend>),
    Absent(String),
}

/// Chooses and builds exactly one backend.
pub struct BackendSelector {
    providers: Vec<Box<dyn BackendProvider>>,
}

impl BackendSelector {
    /// Build a selector over arbitrary providers.
    ///
    /// Automatic selection walks [`BackendKind::PREFERENCE_ORDER`], not the
    /// order of `providers`.
    pub fn new(providers: Vec<Box<dyn BackendProvider>>) -> Self {
        Self { providers }
    }

    /// Selector over the real backends configured from `settings`.
    pub fn from_settings(settings: &SilenceSettings) -> Self {
        Self::new(default_providers(settings))
    }

    fn provider(&self, kind: BackendKind) -> Option<&dyn BackendProvider> {
        self.providers
            .iter()
            .find(|provider| provider.kind() == kind)
            .map(|provider| provider.as_ref())
    }

    /// Probe then construct one backend kind.
    ///
    /// Absence, whether reported by the probe or by construction, is
    /// returned as [`Attempt::Absent`]; anything else is a hard error.
    fn attempt(&self, kind: BackendKind) -> Result<Attempt, SelectError> {
        let Some(provider) = self.provider(kind) else {
            return Ok(Attempt::Absent("no provider registered".to_string()));
        };

        if let Availability::Missing(reason) = provider.probe() {
            return Ok(Attempt::Absent(reason));
        }

        match provider.construct() {
            Ok(backend) => Ok(Attempt::Built(backend)),
            Err(BackendError::Unavailable(reason)) => Ok(Attempt::Absent(reason)),
            Err(source) => Err(SelectError::Construction { kind, source }),
        }
    }

    /// Choose a backend according to `preference`.
    ///
    /// # Errors
    /// * [`SelectError::NoBackendAvailable`] when `Auto` finds nothing.
    /// * [`SelectError::Unavailable`] when an explicit backend is absent.
    /// * [`SelectError::Construction`] when construction fails for any
    ///   reason other than absence.
    pub fn select(
        &self,
        preference: BackendPreference,
    ) -> Result<Box<dyn SilenceBackend>, SelectError> {
        match preference {
            BackendPreference::Explicit(kind) => match self.attempt(kind)? {
                Attempt::Built(backend) => {
                    info!("Using {} backend", kind);
                    Ok(backend)
                }
                Attempt::Absent(reason) => Err(SelectError::Unavailable { kind, reason }),
            },
            BackendPreference::Auto => {
                let mut skipped = Vec::new();
                for kind in BackendKind::PREFERENCE_ORDER {
                    match self.attempt(kind)? {
                        Attempt::Built(backend) => {
                            info!("Using {} backend", kind);
                            return Ok(backend);
                        }
                        Attempt::Absent(reason) => {
                            warn!("Backend {} not available: {}", kind, reason);
                            skipped.push((kind, reason));
                        }
                    }
                }
                Err(SelectError::NoBackendAvailable { skipped })
            }
        }
    }
}
