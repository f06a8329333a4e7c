//! Error types for feature extraction and dataset building.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Settings document missing, unreadable or lacking a key
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    /// Filesystem access failed
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Audio file could not be opened, probed or decoded
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// Not enough analysis frames for the delta filter window
    #[error("{frames} frames is shorter than the delta window of {width}")]
    TooShort { frames: usize, width: usize },

    /// Feature parameters out of range
    #[error("invalid feature parameters: {0}")]
    InvalidParams(String),

    /// Archive could not be created or written
    #[error("archive error at {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn archive<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Error::Archive {
            path: path.into(),
            source: source.into(),
        }
    }
}
