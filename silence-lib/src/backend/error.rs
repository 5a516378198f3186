use std::fmt::{Display, Formatter};

/// Error type for backend construction and playback.
#[derive(Debug)]
pub enum BackendError {
    /// A library, device or tool the backend needs is absent.
    Unavailable(String),
    /// Writing or playing failed after the backend was constructed.
    Runtime(String),
    Io(std::io::Error),
}

impl BackendError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "backend unavailable: {}", reason),
            Self::Runtime(err) => write!(f, "playback error: {}", err),
            Self::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<hound::Error> for BackendError {
    fn from(value: hound::Error) -> Self {
        match value {
            hound::Error::IoError(err) => Self::Io(err),
            other => Self::Runtime(format!("wav encoding failed: {}", other)),
        }
    }
}
