//! Error types for the persistence and configuration layers.
//!
//! The routing core itself never fails: lookups return `Option`, mutators
//! return `bool`, and the transfer pass absorbs environment problems.
//! Errors only surface where an operator-facing caller does file I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Failures reading or writing the registry file or a portable record
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("registry file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("portable record encoding error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),

    #[error("unsupported registry format version: expected at most {supported}, found {found}")]
    UnsupportedVersion { supported: u32, found: u32 },
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
