//! The console: an explicit owner of everything a CLI run needs.
//!
//! A [`Console`] holds the command tree, the alias registry, console-wide
//! settings, the service container, the extension graph and the interrupt
//! flag. Commands are registered directly with [`Console::command`] or loaded
//! from configuration by [`Console::activate`]; [`Console::run`] dispatches a
//! single argument vector and reports an [`Outcome`].
//!
//! # Examples
//!
//! ```
//! use command_scaffold_core::*;
//! use serde_json::json;
//!
//! let mut console = Console::new("app");
//! console
//!     .command(
//!         Command::new(
//!             "db migrate",
//!             Handler::new("app::migrate", |inv| {
//!                 assert_eq!(inv.args.get_str("target"), Some("prod"));
//!                 Ok(())
//!             })
//!             .param(ParameterDecl::new("target").typed(ValueType::String)),
//!         )
//!         .unwrap()
//!         .with_alias("mdb"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(console.run(["mdb", "--target", "prod"]), Outcome::Executed);
//! assert_eq!(console.run(["db"]), Outcome::NothingExecuted);
//! ```

use std::fmt;
use std::io::{self, Write};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::alias::AliasRegistry;
use crate::container::Core;
use crate::dispatch::{Dispatcher, Outcome, Resolution};
use crate::error::{ActivationError, BuildError, DispatchError, HandlerError, StartupError};
use crate::extension::{ExtensionCatalog, ExtensionGraph};
use crate::interrupt::InterruptFlag;
use crate::source::CommandSource;
use crate::tree::CommandTree;
use crate::types::{Command, CommandId, Invocation, ParsedArgs};

/// Owner of the command tree, aliases, settings and extension state.
#[derive(Debug)]
pub struct Console {
    name: String,
    about: Option<String>,
    tree: CommandTree,
    aliases: AliasRegistry,
    settings: Map<String, Value>,
    core: Core,
    extensions: ExtensionGraph,
    interrupt: InterruptFlag,
}

impl Console {
    /// Creates an empty console; `name` is the program name in usage lines.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            about: None,
            tree: CommandTree::new(),
            aliases: AliasRegistry::new(),
            settings: Map::new(),
            core: Core::new(),
            extensions: ExtensionGraph::new(),
            interrupt: InterruptFlag::new(),
        }
    }

    /// Sets the root help description.
    pub fn with_about(mut self, about: &str) -> Self {
        self.about = Some(about.to_string());
        self
    }

    /// Shares an existing interrupt flag, e.g. one wired to a signal handler.
    pub fn with_interrupt(mut self, interrupt: InterruptFlag) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Registers a command and its declared aliases.
    ///
    /// The handler schema is inferred immediately so type errors surface at
    /// registration.
    ///
    /// # Errors
    ///
    /// Any [`BuildError`]. On error neither the command nor any of its
    /// aliases is registered.
    pub fn command(&mut self, command: Command) -> Result<&mut Self, BuildError> {
        let mut tree = self.tree.clone();
        let mut aliases = self.aliases.clone();
        register(&mut tree, &mut aliases, command)?;
        self.tree = tree;
        self.aliases = aliases;
        Ok(self)
    }

    /// Binds `name` to the command registered at `id`.
    ///
    /// # Errors
    ///
    /// See [`AliasRegistry::register`].
    pub fn alias(&mut self, name: &str, id: &str) -> Result<&mut Self, BuildError> {
        let target = CommandId::parse(id)?;
        self.aliases.register(name, &target, &self.tree)?;
        Ok(self)
    }

    /// Applies a merged configuration.
    ///
    /// Reads `settings`, activates the extensions listed under `extensions`
    /// (looked up in `catalog`), then loads commands from every source whose
    /// section is present. Loaded commands are registered in identifier
    /// order, each followed by its aliases.
    ///
    /// # Errors
    ///
    /// Any build or activation failure. The tree and aliases are left as
    /// they were; extensions activated before the failure stay active.
    pub fn activate(
        &mut self,
        config: &Value,
        catalog: &ExtensionCatalog,
        sources: &[&dyn CommandSource],
    ) -> Result<&mut Self, StartupError> {
        let empty = Map::new();
        let sections = match config {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return Err(BuildError::InvalidSection {
                    section: "configuration".to_string(),
                    reason: "expected a mapping".to_string(),
                }
                .into());
            }
        };

        let settings = match sections.get("settings") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(settings)) => settings.clone(),
            Some(_) => {
                return Err(BuildError::InvalidSection {
                    section: "settings".to_string(),
                    reason: "expected a mapping".to_string(),
                }
                .into());
            }
        };

        let names = extension_names(sections.get("extensions"))?;
        let activated = self
            .extensions
            .activate_all(&names, catalog, &mut self.core, config)?;
        debug!(activated = ?activated, "extensions activated");

        let mut loaded = Vec::new();
        for source in sources {
            match sections.get(source.section_name()) {
                None | Some(Value::Null) => {}
                Some(section) => loaded.extend(source.commands(section, &self.core)?),
            }
        }
        loaded.sort_by(|a, b| a.id().cmp(b.id()));

        let mut tree = self.tree.clone();
        let mut aliases = self.aliases.clone();
        for command in loaded {
            register(&mut tree, &mut aliases, command)?;
        }

        info!(commands = tree.len(), aliases = aliases.len(), "console activated");
        self.tree = tree;
        self.aliases = aliases;
        self.settings = settings;
        Ok(self)
    }

    /// Builds the parser hierarchy for the current tree.
    ///
    /// # Errors
    ///
    /// Propagates schema inference failures.
    pub fn build_dispatcher(&self) -> Result<Dispatcher<'_>, BuildError> {
        Dispatcher::new(&self.name, self.about.as_deref(), &self.tree, &self.aliases)
    }

    /// Matches `args` (without the program name) without invoking anything.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::resolve`].
    pub fn resolve<I, T>(&self, args: I) -> Result<Resolution, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.build_dispatcher()?.resolve(args)
    }

    /// Dispatches `args` (without the program name), writing help to stdout
    /// and diagnostics to stderr.
    pub fn run<I, T>(&self, args: I) -> Outcome
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.run_to(args, &mut io::stdout(), &mut io::stderr())
    }

    /// Like [`run`](Self::run), writing to the given streams.
    ///
    /// The interrupt flag is cleared before dispatching, so an interruption
    /// only affects the run it happened in.
    pub fn run_to<I, T>(&self, args: I, out: &mut dyn Write, err: &mut dyn Write) -> Outcome
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.interrupt.clear();
        if self.tree.is_empty() {
            emit(err, format_args!("No commands available\n"));
            return Outcome::NothingExecuted;
        }

        let mut dispatcher = match self.build_dispatcher() {
            Ok(dispatcher) => dispatcher,
            Err(e) => {
                emit(err, format_args!("error: {e}\n"));
                return Outcome::StartupFailed;
            }
        };

        match dispatcher.resolve(args) {
            Ok(Resolution::Invoke { command, args, .. }) => self.execute(&command, &args, err),
            Ok(Resolution::Help { text, requested }) => {
                emit(out, format_args!("{text}"));
                if requested {
                    Outcome::HelpDisplayed
                } else {
                    Outcome::NothingExecuted
                }
            }
            Err(DispatchError::Usage(e)) => {
                emit(err, format_args!("{e}"));
                Outcome::UsageError
            }
            Err(e @ (DispatchError::NotFound(_) | DispatchError::RoutingOnly(_))) => {
                emit(err, format_args!("{e}\n"));
                Outcome::NothingExecuted
            }
            Err(DispatchError::Build(e)) => {
                emit(err, format_args!("error: {e}\n"));
                Outcome::StartupFailed
            }
        }
    }

    fn execute(&self, command: &Command, args: &ParsedArgs, err: &mut dyn Write) -> Outcome {
        debug!(id = %command.id(), handler = command.handler().identity(), "invoking handler");
        let invocation = Invocation {
            command,
            args,
            console: self,
        };
        let result = command.handler().invoke(&invocation);

        if self.interrupt.is_set() || matches!(result, Err(HandlerError::Interrupted)) {
            emit(err, format_args!("Terminated by user\n"));
            return Outcome::Interrupted;
        }

        match result {
            Ok(()) => Outcome::Executed,
            Err(e @ HandlerError::EmptyResponse(_)) => {
                emit(err, format_args!("error: {e}\n"));
                Outcome::ValidationFailed
            }
            Err(e) => {
                emit(err, format_args!("error: {e}\n"));
                Outcome::HandlerFailed
            }
        }
    }

    /// Program name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `settings` mapping from the last activation.
    pub fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }

    /// The service container.
    pub fn core(&self) -> &Core {
        &self.core
    }

    /// Mutable access to the service container.
    pub fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    /// The interrupt flag handlers observe.
    pub fn interrupt_flag(&self) -> &InterruptFlag {
        &self.interrupt
    }

    /// The command tree.
    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    /// The alias registry.
    pub fn aliases(&self) -> &AliasRegistry {
        &self.aliases
    }

    /// Activated extension names in activation order.
    pub fn activated_extensions(&self) -> &[String] {
        self.extensions.activated()
    }
}

/// Writes one diagnostic or help message; a failing stream is logged.
fn emit(stream: &mut dyn Write, message: fmt::Arguments<'_>) {
    if let Err(e) = stream.write_fmt(message) {
        warn!(error = %e, "failed to write console output");
    }
}

/// Inserts `command` and its aliases.
fn register(
    tree: &mut CommandTree,
    aliases: &mut AliasRegistry,
    command: Command,
) -> Result<(), BuildError> {
    command.handler().schema()?;

    if let Some(first) = command.id().tokens().first() {
        if let Some(existing) = aliases.resolve(first) {
            let owner = tree
                .resolve(existing.tokens())
                .map(|c| c.handler().identity().to_string())
                .unwrap_or_else(|_| existing.to_string());
            return Err(BuildError::AliasConflict {
                alias: first.clone(),
                target: command.handler().identity().to_string(),
                owner,
                owner_description: Some(format!("alias to \"{existing}\"")),
            });
        }
    }

    let id = command.id().clone();
    let declared = command.aliases().to_vec();
    tree.insert(command)?;
    for alias in declared {
        aliases.register(&alias, &id, tree)?;
    }
    Ok(())
}

fn extension_names(section: Option<&Value>) -> Result<Vec<String>, ActivationError> {
    match section {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(String::from).ok_or_else(|| {
                    ActivationError::InvalidSection("every entry must be a string".to_string())
                })
            })
            .collect(),
        Some(_) => Err(ActivationError::InvalidSection(
            "expected a list of names".to_string(),
        )),
    }
}
