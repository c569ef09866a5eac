//! Crate-level error types.

use std::fmt;

use crate::engine::EngineError;

/// Errors produced by the globeview crate.
#[derive(Debug)]
pub enum GlobeViewError {
    /// A stage of engine provisioning failed (terrain, viewer, buildings).
    Engine(EngineError),
    /// Engine-access config parsing/serialization failure.
    ConfigParse(String),
    /// The engine access token is missing from config and environment.
    MissingAccessToken,
    /// Generic I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for GlobeViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engine(e) => write!(f, "engine error: {e}"),
            Self::ConfigParse(msg) => {
                write!(f, "config parse error: {msg}")
            }
            Self::MissingAccessToken => {
                write!(f, "no engine access token configured")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for GlobeViewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EngineError> for GlobeViewError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

impl From<std::io::Error> for GlobeViewError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
