//! Error types for configuration loading.
//!
//! Covers reading and writing configuration files, decoding either supported
//! format, and folding documents together.

use std::path::PathBuf;

use command_scaffold_core::MergeError;
use thiserror::Error;

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The file extension maps to no supported format.
    #[error("unsupported configuration format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A document could not be folded into the accumulated configuration.
    #[error("cannot merge configuration: {0}")]
    MergeError(#[from] MergeError),

    /// A configuration document is not a mapping at the top level.
    #[error("{} must contain a mapping, found a {kind}", .path.display())]
    NotAMapping {
        /// File that was loaded.
        path: PathBuf,
        /// JSON kind of the top-level value.
        kind: &'static str,
    },
}

impl ConfigError {
    /// Returns `true` when the error is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
