//! Error types for parameter and preset operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the parameter protocol and the preset store.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A `set` value failed to parse. The parameter is left untouched.
    #[error("invalid value '{value}' for {key}")]
    InvalidValue {
        /// The parameter key being set.
        key: String,
        /// The rejected value.
        value: String,
    },

    /// Failed to read a preset file.
    #[error("failed to read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a preset file.
    #[error("failed to write '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create the preset directory.
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON in a preset or the index.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Asked for a preset that does not exist.
    #[error("preset not found: {0}")]
    PresetNotFound(String),

    /// User saves may not use reserved (underscore-prefixed or empty) names.
    #[error("preset name not accepted: '{0}'")]
    ReservedName(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: &str) -> Self {
        Self::InvalidValue {
            key: key.to_owned(),
            value: value.to_owned(),
        }
    }
}
