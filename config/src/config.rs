//! Typed view of a console configuration.
//!
//! Files are JSON (`.json`) or YAML (`.yml`, `.yaml`), chosen by extension.
//!
//! # Example YAML
//!
//! ```yaml
//! extensions:
//!   - scaffold.ext.greeter
//! imports:
//!   - scaffold.sample
//! services: []
//! settings:
//!   region: eu
//! greeter:
//!   greeting: hi
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use command_scaffold_core::value_kind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// On-disk configuration format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.json`
    Json,
    /// `.yml` or `.yaml`
    Yaml,
}

impl Format {
    /// Format implied by the extension of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for any other extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_scaffold_config::Format;
    ///
    /// assert_eq!(Format::from_path("cli.json").unwrap(), Format::Json);
    /// assert_eq!(Format::from_path("cli.YML").unwrap(), Format::Yaml);
    /// assert!(Format::from_path("cli.toml").is_err());
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Format::Json),
            Some("yml" | "yaml") => Ok(Format::Yaml),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Decodes a document from `reader`.
    pub fn read<R: std::io::Read>(self, reader: R) -> Result<Value> {
        Ok(match self {
            Format::Json => serde_json::from_reader(reader)?,
            Format::Yaml => serde_yaml::from_reader(reader)?,
        })
    }

    /// Encodes `value` into `writer`.
    pub fn write<W: Write, T: Serialize>(self, mut writer: W, value: &T) -> Result<()> {
        match self {
            Format::Json => {
                serde_json::to_writer_pretty(&mut writer, value)?;
                writeln!(writer)?;
            }
            Format::Yaml => serde_yaml::to_writer(&mut writer, value)?,
        }
        writer.flush()?;
        Ok(())
    }
}

/// Reads one configuration document, which must be a mapping.
///
/// A document that is just `null` counts as an empty mapping.
///
/// # Errors
///
/// [`ConfigError::UnsupportedFormat`], I/O and decoding errors, and
/// [`ConfigError::NotAMapping`] when the top level is not a mapping.
pub fn load_document(path: impl AsRef<Path>) -> Result<Map<String, Value>> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let reader = BufReader::new(File::open(path)?);
    let document = format.read(reader)?;
    debug!(path = %path.display(), ?format, "loaded configuration document");

    match document {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ConfigError::NotAMapping {
            path: path.to_path_buf(),
            kind: value_kind(&other),
        }),
    }
}

/// Recognized sections of a console configuration.
///
/// Keys other than the recognized ones (for example extension settings such
/// as `greeter`) are kept in [`extra`](Self::extra).
///
/// # Examples
///
/// ```
/// use command_scaffold_config::AppConfig;
/// use serde_json::json;
///
/// let config = AppConfig::from_value(json!({
///     "imports": ["scaffold.sample"],
///     "greeter": {"greeting": "hi"}
/// }))
/// .unwrap();
///
/// assert_eq!(config.imports, vec!["scaffold.sample"]);
/// assert!(config.extensions.is_empty());
/// assert_eq!(config.extra["greeter"], json!({"greeting": "hi"}));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Extensions to activate, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    /// Additional search paths.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    /// Extension-provided commands to load; empty selects all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
    /// Command modules to import.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    /// Console-wide settings passed to handlers.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,
    /// Every other top-level key.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppConfig {
    /// Loads a single file.
    ///
    /// # Errors
    ///
    /// See [`load_document`]; also [`ConfigError::JsonError`] when a
    /// recognized section has the wrong shape.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_value(Value::Object(load_document(path)?))
    }

    /// Saves to `path`, choosing the format by extension.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnsupportedFormat`], I/O and encoding errors.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let writer = BufWriter::new(File::create(path)?);
        format.write(writer, self)?;
        debug!(path = %path.display(), ?format, "saved configuration");
        Ok(())
    }

    /// Builds the typed view from a merged value.
    ///
    /// # Errors
    ///
    /// [`ConfigError::JsonError`] when a recognized section has the wrong
    /// shape.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Converts back into a plain mapping value.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
extensions:
  - scaffold.ext.greeter
imports:
  - scaffold.sample
services: []
settings:
  region: eu
greeter:
  greeting: hi
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let value: Value = serde_yaml::from_str(sample_yaml()).unwrap();
        let config = AppConfig::from_value(value).unwrap();
        assert_eq!(config.extensions, vec!["scaffold.ext.greeter"]);
        assert_eq!(config.imports, vec!["scaffold.sample"]);
        assert_eq!(config.services, Some(Vec::new()));
        assert_eq!(config.settings["region"], json!("eu"));
        assert_eq!(config.extra["greeter"], json!({"greeting": "hi"}));
        assert!(config.paths.is_empty());
    }

    #[test]
    fn test_wrong_section_shape_rejected() {
        let err = AppConfig::from_value(json!({"imports": "scaffold.sample"})).unwrap_err();
        assert!(matches!(err, ConfigError::JsonError(_)));
    }

    #[test]
    fn test_to_value_omits_empty_sections() {
        let config = AppConfig {
            imports: vec!["scaffold.sample".to_string()],
            ..AppConfig::default()
        };
        assert_eq!(config.to_value().unwrap(), json!({"imports": ["scaffold.sample"]}));
    }

    #[test]
    fn test_save_load_roundtrip_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let value: Value = serde_yaml::from_str(sample_yaml()).unwrap();
        let original = AppConfig::from_value(value).unwrap();

        for name in ["cli.json", "cli.yml"] {
            let path = dir.path().join(name);
            original.save(&path).unwrap();
            assert_eq!(AppConfig::load(&path).unwrap(), original, "{name}");
        }
    }

    #[test]
    fn test_load_document_requires_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotAMapping { kind: "sequence", .. }));
    }

    #[test]
    fn test_null_document_is_empty_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yaml");
        std::fs::write(&path, "~\n").unwrap();

        assert!(load_document(&path).unwrap().is_empty());
    }
}
