//! Layered JSON/YAML configuration for command-scaffold consoles.
//!
//! Documents are mappings. Several of them fold into one merged value with
//! [`ConfigLoader`], which is what a console activates from. [`AppConfig`]
//! is a typed view of the recognized sections.
//!
//! # Quick start
//!
//! ```no_run
//! use command_scaffold_config::{AppConfig, ConfigLoader, CONFIG_ENV, locate};
//! use serde_json::json;
//!
//! let explicit = std::env::var(CONFIG_ENV).ok();
//! let mut loader = ConfigLoader::new().value(json!({"imports": ["scaffold.builtin"]}));
//! if let Some(path) = locate(explicit.as_deref(), std::path::Path::new(".")) {
//!     loader = loader.file(path);
//! }
//!
//! let merged = loader.build().unwrap();
//! let typed = AppConfig::from_value(merged).unwrap();
//! println!("{} imports", typed.imports.len());
//! ```

mod config;
mod error;
mod loader;

pub use config::{AppConfig, Format, load_document};
pub use error::{ConfigError, Result};
pub use loader::{CONFIG_ENV, ConfigLoader, ConfigSource, DEFAULT_FILE_NAMES, locate};
