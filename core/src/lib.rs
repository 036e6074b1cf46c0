//! Command tree construction, dispatch and extension activation for CLI
//! applications.
//!
//! This crate turns declared commands and extensions into a runnable console:
//!
//! - [`Command`] and [`Handler`] describe what can be invoked; handler
//!   parameters are declared explicitly with [`ParameterDecl`] and inferred
//!   into [`ParameterSpec`]s by [`infer_parameters`].
//! - [`CommandTree`] stores commands in a token trie and [`AliasRegistry`]
//!   binds secondary top-level names to them.
//! - [`Dispatcher`] synthesizes the `clap` parser hierarchy and resolves an
//!   argument vector to one command.
//! - [`ExtensionGraph`] activates [`Extension`]s from an
//!   [`ExtensionCatalog`] in dependency order, exactly once each.
//! - [`ConfigMerger`] folds configuration sources with section-aware rules.
//! - [`Console`] owns all of the above and reports an [`Outcome`] per run.
//!
//! # Example
//!
//! ```
//! use command_scaffold_core::*;
//! use serde_json::json;
//!
//! let mut catalog = CommandCatalog::new();
//! catalog.register(
//!     "app.commands",
//!     Command::new(
//!         "add",
//!         Handler::new("app::add", |inv| {
//!             let sum = inv.args.get_i64("a").unwrap_or(0) + inv.args.get_i64("b").unwrap_or(0);
//!             assert_eq!(sum, 5);
//!             Ok(())
//!         })
//!         .param(ParameterDecl::new("a").typed(ValueType::Integer))
//!         .param(ParameterDecl::new("b").typed(ValueType::Integer)),
//!     )
//!     .unwrap(),
//! );
//!
//! let mut merger = ConfigMerger::new();
//! merger.merge(json!({"imports": ["app.commands"]})).unwrap();
//!
//! let imports = ImportSource::new(catalog);
//! let mut console = Console::new("app");
//! console
//!     .activate(&merger.finish(), &ExtensionCatalog::new(), &[&imports])
//!     .unwrap();
//!
//! assert_eq!(console.run(["add", "--a", "2", "--b", "3"]), Outcome::Executed);
//! assert_eq!(console.run(["add"]).exit_code(), 2);
//! ```

mod alias;
mod console;
mod container;
mod dispatch;
mod error;
mod extension;
mod interrupt;
mod merge;
mod schema;
mod source;
mod tree;
mod types;
mod validate;

pub use alias::AliasRegistry;
pub use console::Console;
pub use container::Core;
pub use dispatch::{Dispatcher, Outcome, PROCESS_DEBUG, Resolution, process_debug_requested};
pub use error::{
    ActivationError, BuildError, DispatchError, HandlerError, MergeError, StartupError,
};
pub use extension::{Extension, ExtensionCatalog, ExtensionGraph, ExtensionResult, resolve_settings};
pub use interrupt::InterruptFlag;
pub use merge::{
    ConfigMerger, MAPPING_SECTIONS, SEQUENCE_SECTIONS, SectionPolicy, merge_config, value_kind,
};
pub use schema::infer_parameters;
pub use source::{CommandCatalog, CommandSource, ImportSource, ServiceSource};
pub use tree::{CommandNode, CommandTree};
pub use types::*;
pub use validate::{is_separator, option_name, split_identifier, validate_token};
