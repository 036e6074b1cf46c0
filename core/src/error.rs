//! Error taxonomy for command registration, extension activation and
//! dispatch.
//!
//! Build-time errors ([`BuildError`]) and activation errors
//! ([`ActivationError`]) are fatal: they abort startup before any handler
//! runs. [`DispatchError`] covers failures while matching an argument vector
//! against the built tree, and [`HandlerError`] is what a command handler
//! reports back to the console.

use thiserror::Error;

/// Errors raised while registering commands, aliases and parameter schemas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A command identifier produced no tokens.
    #[error("command identifier cannot be empty")]
    EmptyCommandId,
    /// A token or alias name contains a separator or is otherwise unusable.
    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),
    /// Two commands were registered at the same terminal path.
    #[error("the command ID \"{id}\" has already been defined for {existing} (rejected {rejected})")]
    DuplicateCommand {
        /// Space-joined command path.
        id: String,
        /// Identity of the handler registered first.
        existing: String,
        /// Identity of the handler that was rejected.
        rejected: String,
    },
    /// An alias collides with an existing alias or canonical name.
    #[error("cannot set \"{alias}\" for {target} as it refers to {owner} ({})", .owner_description.as_deref().unwrap_or("no description"))]
    AliasConflict {
        /// The alias name being registered.
        alias: String,
        /// Identity of the command the rejected alias would have pointed to.
        target: String,
        /// Identity of whatever already owns the name.
        owner: String,
        /// Description of the existing owner, if any.
        owner_description: Option<String>,
    },
    /// An alias points at a path that holds no command.
    #[error("alias \"{alias}\" refers to unknown command \"{target}\"")]
    UnknownAliasTarget {
        /// The alias name being registered.
        alias: String,
        /// Space-joined path the alias was meant to target.
        target: String,
    },
    /// A parameter annotation names more than one concrete type.
    #[error("cannot infer the type of parameter \"{parameter}\" of {handler}: expected exactly one non-none type, found [{}]", .types.join(", "))]
    AmbiguousType {
        /// Handler identity.
        handler: String,
        /// Parameter name.
        parameter: String,
        /// Concrete types found in the annotation.
        types: Vec<String>,
    },
    /// Two parameters of one handler map to the same option name.
    #[error("parameter \"{parameter}\" of {handler} is declared more than once")]
    DuplicateParameter {
        /// Handler identity.
        handler: String,
        /// Parameter (or rendered option) name.
        parameter: String,
    },
    /// A flag parameter declares a default other than `false`; absence of a
    /// flag always means `false`.
    #[error("flag parameter \"{parameter}\" of {handler} must default to false, got {default}")]
    FlagDefault {
        /// Handler identity.
        handler: String,
        /// Parameter name.
        parameter: String,
        /// The declared default.
        default: String,
    },
    /// A parameter uses a name the parser reserves for itself.
    #[error("parameter \"{parameter}\" of {handler} uses a reserved name")]
    ReservedParameter {
        /// Handler identity.
        handler: String,
        /// Parameter name.
        parameter: String,
    },
    /// A command source names a module nothing was registered under.
    #[error("unable to import {0}")]
    UnknownModule(String),
    /// A command source section has an unexpected shape.
    #[error("invalid \"{section}\" section: {reason}")]
    InvalidSection {
        /// Configuration section name.
        section: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Errors raised while activating extensions.
#[derive(Debug, Error)]
pub enum ActivationError {
    /// An extension (transitively) depends on itself.
    #[error("cyclic extension dependency: {}", .chain.join(" -> "))]
    CyclicDependency {
        /// Activation chain ending with the re-entered extension.
        chain: Vec<String>,
    },
    /// Supplied configuration does not have the shape of the defaults.
    #[error("extension {extension} expects \"{key}\" to be a {expected}, got a {actual}")]
    ConfigTypeMismatch {
        /// Extension name.
        extension: String,
        /// Configuration key the extension reads.
        key: String,
        /// Kind of the default settings.
        expected: &'static str,
        /// Kind of the supplied configuration.
        actual: &'static str,
    },
    /// The name is not present in the extension catalog.
    #[error("unknown extension {0}")]
    UnknownExtension(String),
    /// The extension reads a key that is absent and has no defaults.
    #[error("extension {extension} requires configuration \"{key}\" and declares no default settings")]
    MissingConfiguration {
        /// Extension name.
        extension: String,
        /// Configuration key the extension reads.
        key: String,
    },
    /// The extension's own initializer failed.
    #[error("extension {extension} failed to initialize: {source}")]
    Initialization {
        /// Extension name.
        extension: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The `extensions` section is not a list of names.
    #[error("invalid \"extensions\" section: {0}")]
    InvalidSection(String),
}

/// Errors raised while folding configuration sources together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// A configuration document is not a mapping at the top level.
    #[error("configuration must be a mapping, got a {0}")]
    NotAMapping(&'static str),
    /// A recognized section holds the wrong kind of value.
    #[error("section \"{section}\" must be a {expected}, got a {actual}")]
    SectionType {
        /// Section name.
        section: String,
        /// Kind the section requires.
        expected: &'static str,
        /// Kind that was found.
        actual: &'static str,
    },
}

/// Errors raised while matching an argument vector against the tree.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No node exists at the path.
    #[error("no command matches \"{0}\"")]
    NotFound(String),
    /// The path names a routing node that holds no command.
    #[error("\"{0}\" is a command group, not a command")]
    RoutingOnly(String),
    /// The argument vector does not satisfy the parser.
    #[error(transparent)]
    Usage(#[from] clap::Error),
    /// The dispatcher could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Failure reported by a command handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler failed; the message is shown to the user as is.
    #[error("{0}")]
    Failed(String),
    /// The handler noticed the interrupt flag and stopped.
    #[error("terminated by user")]
    Interrupted,
    /// A required response was left empty.
    #[error("empty response for {0}")]
    EmptyResponse(String),
    /// I/O failure inside the handler.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Any other error the handler propagated with `?`.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    /// Builds a [`HandlerError::Failed`] from any displayable message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors that abort [`Console::activate`](crate::Console::activate).
#[derive(Debug, Error)]
pub enum StartupError {
    /// Command or alias registration failed.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// Extension activation failed.
    #[error(transparent)]
    Activation(#[from] ActivationError),
}
