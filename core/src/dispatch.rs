//! Parser synthesis and argument-vector resolution.
//!
//! [`Dispatcher`] turns a [`CommandTree`] and its [`AliasRegistry`] into a
//! `clap` command hierarchy: every tree node becomes a parser level, a node
//! holding a command carries that command's options, and each alias becomes a
//! top-level parser built from its canonical node. Resolving an argument
//! vector yields either the command to invoke with its parsed values, or the
//! help text of the deepest node that matched.

use clap::builder::PossibleValuesParser;
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, value_parser};
use serde_json::Value;
use tracing::debug;

use crate::alias::AliasRegistry;
use crate::error::{BuildError, DispatchError};
use crate::tree::{CommandNode, CommandTree};
use crate::types::{Command, ParameterSpec, ParsedArgs, ValueType};

/// Identifier of the global flag that raises log verbosity.
pub const PROCESS_DEBUG: &str = "process-debug";

/// Returns `true` when `args` carry the global `--process-debug` flag.
///
/// Logging is configured before any parser exists, so the flag is read from
/// the raw argument vector. Tokens after a `--` terminator are ignored.
///
/// # Examples
///
/// ```
/// use command_scaffold_core::process_debug_requested;
///
/// assert!(process_debug_requested(&["ls", "--process-debug"]));
/// assert!(!process_debug_requested(&["greet", "--", "--process-debug"]));
/// ```
pub fn process_debug_requested<S: AsRef<str>>(args: &[S]) -> bool {
    let flag = format!("--{PROCESS_DEBUG}");
    args.iter()
        .map(AsRef::as_ref)
        .take_while(|arg| *arg != "--")
        .any(|arg| arg == flag)
}

/// Result of matching an argument vector.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A command matched and its arguments parsed.
    Invoke {
        /// The canonical command (also when reached through an alias).
        command: Command,
        /// Parsed values keyed by declared parameter name.
        args: ParsedArgs,
    },
    /// Nothing to invoke; `text` is the help of the deepest matched node.
    Help {
        /// Rendered help.
        text: String,
        /// `true` when the user asked for help explicitly.
        requested: bool,
    },
}

/// How one console run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The handler completed.
    Executed,
    /// Help was explicitly requested and printed.
    HelpDisplayed,
    /// The handler reported a failure.
    HandlerFailed,
    /// The dispatcher could not be built.
    StartupFailed,
    /// The argument vector did not satisfy the parser.
    UsageError,
    /// The handler rejected an empty response.
    ValidationFailed,
    /// No handler ran: no commands, no match, or a routing node.
    NothingExecuted,
    /// The user interrupted the handler.
    Interrupted,
}

impl Outcome {
    /// Process exit status for this outcome.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_scaffold_core::Outcome;
    ///
    /// assert_eq!(Outcome::Executed.exit_code(), 0);
    /// assert_eq!(Outcome::NothingExecuted.exit_code(), 15);
    /// assert_eq!(Outcome::Interrupted.exit_code(), 130);
    /// ```
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Executed | Outcome::HelpDisplayed => 0,
            Outcome::HandlerFailed | Outcome::StartupFailed => 1,
            Outcome::UsageError => 2,
            Outcome::ValidationFailed => 3,
            Outcome::NothingExecuted => 15,
            Outcome::Interrupted => 130,
        }
    }

    /// Returns `true` for the zero exit status outcomes.
    pub fn is_success(self) -> bool {
        self.exit_code() == 0
    }
}

/// Synthesized parser hierarchy bound to the tree it was built from.
#[derive(Debug)]
pub struct Dispatcher<'a> {
    root: clap::Command,
    tree: &'a CommandTree,
    aliases: &'a AliasRegistry,
}

impl<'a> Dispatcher<'a> {
    /// Builds the parser hierarchy.
    ///
    /// # Errors
    ///
    /// Propagates schema inference failures from any handler.
    pub fn new(
        name: &str,
        about: Option<&str>,
        tree: &'a CommandTree,
        aliases: &'a AliasRegistry,
    ) -> Result<Self, BuildError> {
        let mut root = clap::Command::new(name.to_string())
            .disable_help_subcommand(true)
            .arg(
                Arg::new(PROCESS_DEBUG)
                    .long(PROCESS_DEBUG)
                    .action(ArgAction::SetTrue)
                    .global(true)
                    .help("Enable debug logging"),
            );
        if let Some(about) = about {
            root = root.about(about.to_string());
        }

        for (token, child) in tree.root().children() {
            root = root.subcommand(build_node(clap::Command::new(token.to_string()), child)?);
        }

        for (alias, target) in aliases.iter() {
            let Some(node) = tree.node(target.tokens()) else {
                continue;
            };
            let parser = build_node(clap::Command::new(alias.to_string()), node)?
                .about(format!("Alias to \"{target}\""));
            root = root.subcommand(parser);
        }

        debug!(commands = tree.len(), aliases = aliases.len(), "built dispatcher");
        Ok(Self {
            root,
            tree,
            aliases,
        })
    }

    /// The root parser.
    pub fn command(&self) -> &clap::Command {
        &self.root
    }

    /// Matches `args` (without the program name) against the hierarchy.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Usage`] when the arguments do not satisfy the parser
    /// of the matched command.
    pub fn resolve<I, T>(&mut self, args: I) -> Result<Resolution, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let argv = std::iter::once(self.root.get_name().to_string()).chain(args.iter().cloned());

        let matches = match self.root.try_get_matches_from_mut(argv) {
            Ok(matches) => matches,
            Err(err) => {
                return match err.kind() {
                    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Ok(Resolution::Help {
                        text: err.to_string(),
                        requested: true,
                    }),
                    ErrorKind::InvalidSubcommand
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                        let path = self.matched_prefix(&args);
                        Ok(Resolution::Help {
                            text: self.help_for(&path),
                            requested: false,
                        })
                    }
                    _ => Err(DispatchError::Usage(err)),
                };
            }
        };

        let mut path = Vec::new();
        let mut current = &matches;
        while let Some((name, sub)) = current.subcommand() {
            path.push(name.to_string());
            current = sub;
        }

        let tree = self.tree;
        let canonical = self.canonical_path(&path);
        match tree.node(canonical.as_slice()).and_then(CommandNode::command) {
            Some(command) => {
                let args = extract_args(current, command.handler().schema()?);
                debug!(id = %command.id(), invoked_as = %path.join(" "), "resolved command");
                Ok(Resolution::Invoke {
                    command: command.clone(),
                    args,
                })
            }
            None => Ok(Resolution::Help {
                text: self.help_for(&path),
                requested: false,
            }),
        }
    }

    /// Replaces a leading alias token with its canonical path.
    fn canonical_path(&self, path: &[String]) -> Vec<String> {
        match path.split_first() {
            Some((first, rest)) => match self.aliases.resolve(first) {
                Some(target) => target.tokens().iter().chain(rest).cloned().collect(),
                None => path.to_vec(),
            },
            None => Vec::new(),
        }
    }

    /// Leading tokens of `args` that name nested parsers.
    fn matched_prefix(&self, args: &[String]) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = &self.root;
        for token in args.iter().filter(|token| !token.starts_with('-')) {
            match current.find_subcommand(token) {
                Some(next) => {
                    path.push(token.clone());
                    current = next;
                }
                None => break,
            }
        }
        path
    }

    /// Help of the parser at `path`, rendered with its full usage line.
    fn help_for(&mut self, path: &[String]) -> String {
        self.root.build();
        let mut current = &self.root;
        for token in path {
            match current.find_subcommand(token) {
                Some(next) => current = next,
                None => break,
            }
        }
        current.clone().render_help().to_string()
    }
}

fn build_node(parser: clap::Command, node: &CommandNode) -> Result<clap::Command, BuildError> {
    let mut parser = parser.disable_help_subcommand(true);

    if let Some(command) = node.command() {
        if let Some(description) = command.description() {
            parser = parser.about(description.to_string());
        }
        for spec in command.handler().schema()? {
            parser = parser.arg(build_arg(spec));
        }
        if node.has_children() {
            parser = parser.subcommand_negates_reqs(true);
        }
    }

    for (token, child) in node.children() {
        parser = parser.subcommand(build_node(clap::Command::new(token.to_string()), child)?);
    }
    Ok(parser)
}

fn build_arg(spec: &ParameterSpec) -> Arg {
    let arg = Arg::new(spec.name.clone())
        .long(spec.long_name())
        .help(spec.help_text());

    match &spec.value_type {
        ValueType::Bool => arg.action(ArgAction::SetTrue),
        ValueType::String => arg
            .action(ArgAction::Set)
            .required(spec.required)
            .value_parser(value_parser!(String)),
        ValueType::Integer => arg
            .action(ArgAction::Set)
            .required(spec.required)
            .allow_negative_numbers(true)
            .value_parser(value_parser!(i64)),
        ValueType::Float => arg
            .action(ArgAction::Set)
            .required(spec.required)
            .allow_negative_numbers(true)
            .value_parser(value_parser!(f64)),
        ValueType::Choice(choices) => arg
            .action(ArgAction::Set)
            .required(spec.required)
            .value_parser(PossibleValuesParser::new(choices.clone())),
    }
}

fn extract_args(matches: &ArgMatches, specs: &[ParameterSpec]) -> ParsedArgs {
    let mut args = ParsedArgs::new();
    for spec in specs {
        let supplied = match &spec.value_type {
            ValueType::Bool => matches.get_flag(&spec.name).then_some(Value::Bool(true)),
            ValueType::String | ValueType::Choice(_) => matches
                .get_one::<String>(&spec.name)
                .map(|v| Value::String(v.clone())),
            ValueType::Integer => matches.get_one::<i64>(&spec.name).map(|v| Value::from(*v)),
            ValueType::Float => matches.get_one::<f64>(&spec.name).map(|v| Value::from(*v)),
        };
        let value = supplied
            .or_else(|| spec.default.clone())
            .unwrap_or(Value::Null);
        args.insert(&spec.name, value);
    }
    args
}
