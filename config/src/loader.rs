//! Layered configuration loading with a builder.
//!
//! [`ConfigLoader`] folds every configured source, in the order added,
//! through [`ConfigMerger`]: recognized list sections concatenate,
//! `settings` merges key by key, and other keys follow override rules.
//!
//! # Loading pattern
//!
//! ```no_run
//! use command_scaffold_config::ConfigLoader;
//! use serde_json::json;
//!
//! let config = ConfigLoader::new()
//!     .value(json!({"imports": ["scaffold.builtin"]}))
//!     .file("/etc/scaffold/cli.yml")
//!     .optional_file("cli.json")
//!     .build()
//!     .unwrap();
//! ```

use std::path::{Path, PathBuf};

use command_scaffold_core::ConfigMerger;
use serde_json::Value;
use tracing::debug;

use crate::config::load_document;
use crate::error::Result;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "SCAFFOLD_CONF";

/// File names probed, in order, when no explicit file is given.
pub const DEFAULT_FILE_NAMES: &[&str] = &["cli.json", "cli.yml"];

/// One input of a [`ConfigLoader`].
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// A file that must exist.
    File(PathBuf),
    /// A file that is skipped when missing.
    OptionalFile(PathBuf),
    /// An in-memory document.
    Value(Value),
}

/// Builder folding configuration sources in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    /// Creates a loader with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file that must exist.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(ConfigSource::File(path.into()));
        self
    }

    /// Adds a file that is skipped when it does not exist.
    pub fn optional_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(ConfigSource::OptionalFile(path.into()));
        self
    }

    /// Adds an in-memory document.
    pub fn value(mut self, value: Value) -> Self {
        self.sources.push(ConfigSource::Value(value));
        self
    }

    /// Loads and merges every source.
    ///
    /// With no sources, or only missing optional files, the result is an
    /// empty mapping.
    ///
    /// # Errors
    ///
    /// The first load or merge failure.
    pub fn build(self) -> Result<Value> {
        let mut merger = ConfigMerger::new();

        for source in self.sources {
            match source {
                ConfigSource::File(path) => {
                    merger.merge(Value::Object(load_document(&path)?))?;
                }
                ConfigSource::OptionalFile(path) => {
                    if !path.exists() {
                        debug!(path = %path.display(), "optional configuration file absent");
                        continue;
                    }
                    merger.merge(Value::Object(load_document(&path)?))?;
                }
                ConfigSource::Value(value) => {
                    merger.merge(value)?;
                }
            }
        }

        Ok(merger.finish())
    }
}

/// Locates the configuration file for a console.
///
/// `explicit` (typically the value of [`CONFIG_ENV`]) wins when set and
/// non-empty. Otherwise the first of [`DEFAULT_FILE_NAMES`] that exists in
/// `dir` is returned.
///
/// # Examples
///
/// ```
/// use command_scaffold_config::locate;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     locate(Some("custom.yml"), Path::new("/nonexistent")),
///     Some(PathBuf::from("custom.yml"))
/// );
/// assert_eq!(locate(None, Path::new("/nonexistent")), None);
/// ```
pub fn locate(explicit: Option<&str>, dir: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.trim().is_empty()) {
        return Some(PathBuf::from(path));
    }
    DEFAULT_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}
