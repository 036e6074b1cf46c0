//! Command, handler and parameter type definitions.
//!
//! A [`Command`] binds a token path ([`CommandId`]) to a [`Handler`]. The
//! handler carries an explicit, ordered list of [`ParameterDecl`]s from which
//! the parser schema ([`ParameterSpec`]) is inferred once and cached.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::console::Console;
use crate::container::Core;
use crate::error::{BuildError, HandlerError};
use crate::interrupt::InterruptFlag;
use crate::schema::infer_parameters;
use crate::validate::{option_name, split_identifier, validate_token};

/// Value type of a handler parameter.
///
/// # Examples
///
/// ```
/// use command_scaffold_core::ValueType;
///
/// assert_eq!(ValueType::default(), ValueType::String);
/// assert_eq!(ValueType::Integer.to_string(), "int");
///
/// let choices = ValueType::Choice(vec!["json".into(), "yaml".into()]);
/// assert!(matches!(choices, ValueType::Choice(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ValueType {
    /// Boolean, rendered as a presence flag.
    Bool,
    /// String value (the default).
    #[default]
    String,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Float,
    /// One of an enumerated set of strings.
    Choice(Vec<String>),
}

impl ValueType {
    /// Short label used in help text and diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::String => "str",
            ValueType::Integer => "int",
            ValueType::Float => "float",
            ValueType::Choice(_) => "choice",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Declared type annotation of a handler parameter.
///
/// `Union` models an annotation listing several types, optionally including
/// "none". Exactly one concrete member is supported; anything else fails at
/// schema-build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// A single concrete type.
    Plain(ValueType),
    /// A union of concrete types, `nullable` when "none" is a member.
    Union {
        /// Concrete (non-none) members.
        members: Vec<ValueType>,
        /// Whether "none" is one of the members.
        nullable: bool,
    },
}

impl Annotation {
    /// The "optional union with none" form for a single type.
    pub fn optional(value_type: ValueType) -> Self {
        Annotation::Union {
            members: vec![value_type],
            nullable: true,
        }
    }
}

/// A parameter as declared by a handler.
///
/// # Examples
///
/// ```
/// use command_scaffold_core::{ParameterDecl, ValueType};
/// use serde_json::json;
///
/// let target = ParameterDecl::new("target").typed(ValueType::String);
/// let dry_run = ParameterDecl::new("dryRun")
///     .typed(ValueType::Bool)
///     .with_default(json!(false));
/// assert!(target.default.is_none());
/// assert_eq!(dry_run.default, Some(json!(false)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDecl {
    /// Parameter name; parsed values are keyed by it.
    pub name: String,
    /// Type annotation, if any.
    pub annotation: Option<Annotation>,
    /// Declared default value, if any.
    pub default: Option<Value>,
}

impl ParameterDecl {
    /// Creates an unannotated parameter without a default.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            annotation: None,
            default: None,
        }
    }

    /// Annotates with a single concrete type.
    pub fn typed(mut self, value_type: ValueType) -> Self {
        self.annotation = Some(Annotation::Plain(value_type));
        self
    }

    /// Annotates as an optional union of `value_type` with none.
    pub fn optional(mut self, value_type: ValueType) -> Self {
        self.annotation = Some(Annotation::optional(value_type));
        self
    }

    /// Annotates with an arbitrary union.
    pub fn union(mut self, members: Vec<ValueType>, nullable: bool) -> Self {
        self.annotation = Some(Annotation::Union { members, nullable });
        self
    }

    /// Adds a default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Parser-facing schema of one parameter, inferred from a [`ParameterDecl`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Declared parameter name.
    pub name: String,
    /// Resolved value type.
    pub value_type: ValueType,
    /// Whether the option must be supplied.
    pub required: bool,
    /// Value used when the option is absent.
    pub default: Option<Value>,
}

impl ParameterSpec {
    /// Long option name without the leading dashes.
    pub fn long_name(&self) -> String {
        option_name(&self.name)
    }

    /// Returns `true` when the parameter renders as a presence flag.
    pub fn is_flag(&self) -> bool {
        self.value_type == ValueType::Bool
    }

    /// Help line shown next to the option.
    pub fn help_text(&self) -> String {
        let words = self
            .name
            .split('_')
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if self.required {
            format!("({}) {words}", self.value_type)
        } else {
            format!("[Optional] ({}) {words}", self.value_type)
        }
    }
}

/// Token path of a command, e.g. `["db", "migrate"]`.
///
/// # Examples
///
/// ```
/// use command_scaffold_core::CommandId;
///
/// let id = CommandId::parse("db migrate").unwrap();
/// assert_eq!(id.tokens(), ["db", "migrate"]);
/// assert_eq!(id.to_string(), "db migrate");
/// assert!(CommandId::parse("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommandId(Vec<String>);

impl CommandId {
    /// Parses a whitespace- or dot-separated identifier.
    pub fn parse(raw: &str) -> Result<Self, BuildError> {
        Self::from_tokens(split_identifier(raw))
    }

    /// Builds an identifier from already-split tokens.
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self, BuildError> {
        if tokens.is_empty() {
            return Err(BuildError::EmptyCommandId);
        }
        for token in &tokens {
            validate_token(token)?;
        }
        Ok(Self(tokens))
    }

    /// Tokens in path order.
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; an identifier has at least one token.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

type HandlerFn = dyn Fn(&Invocation<'_>) -> Result<(), HandlerError> + Send + Sync;

/// A command handler: identity, declared parameters and the callable.
///
/// The inferred schema is cached on first use, so rebuilding the dispatch
/// tree does not re-run inference.
pub struct Handler {
    identity: String,
    parameters: Vec<ParameterDecl>,
    func: Arc<HandlerFn>,
    schema: OnceLock<Vec<ParameterSpec>>,
}

impl Handler {
    /// Creates a handler with no parameters.
    ///
    /// `identity` names the handler in diagnostics (for instance in
    /// duplicate-command errors) and should be a fully qualified path.
    pub fn new<F>(identity: &str, func: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self {
            identity: identity.to_string(),
            parameters: Vec::new(),
            func: Arc::new(func),
            schema: OnceLock::new(),
        }
    }

    /// Appends a declared parameter.
    pub fn param(mut self, decl: ParameterDecl) -> Self {
        self.parameters.push(decl);
        self.schema = OnceLock::new();
        self
    }

    /// Handler identity.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Declared parameters in order.
    pub fn parameters(&self) -> &[ParameterDecl] {
        &self.parameters
    }

    /// Inferred parameter schema, computed once and cached.
    pub fn schema(&self) -> Result<&[ParameterSpec], BuildError> {
        if let Some(schema) = self.schema.get() {
            return Ok(schema);
        }
        let inferred = infer_parameters(&self.identity, &self.parameters)?;
        Ok(self.schema.get_or_init(|| inferred))
    }

    /// Calls the handler.
    pub fn invoke(&self, invocation: &Invocation<'_>) -> Result<(), HandlerError> {
        (self.func)(invocation)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("identity", &self.identity)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// A registered command.
///
/// # Examples
///
/// ```
/// use command_scaffold_core::*;
///
/// let command = Command::new("db migrate", Handler::new("app::migrate", |_| Ok(())))
///     .unwrap()
///     .with_description("Run database migrations")
///     .with_alias("mdb");
///
/// assert_eq!(command.id().to_string(), "db migrate");
/// assert_eq!(command.aliases(), ["mdb"]);
/// ```
#[derive(Debug, Clone)]
pub struct Command {
    id: CommandId,
    handler: Arc<Handler>,
    description: Option<String>,
    aliases: Vec<String>,
}

impl Command {
    /// Creates a command from a raw identifier.
    pub fn new(id: &str, handler: Handler) -> Result<Self, BuildError> {
        Ok(Self::with_id(CommandId::parse(id)?, Arc::new(handler)))
    }

    /// Creates a command from a parsed identifier and a shared handler.
    pub fn with_id(id: CommandId, handler: Arc<Handler>) -> Self {
        Self {
            id,
            handler,
            description: None,
            aliases: Vec::new(),
        }
    }

    /// Sets the description; leading whitespace is trimmed.
    pub fn with_description(mut self, description: &str) -> Self {
        let trimmed = description.trim_start();
        self.description = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Declares an alias registered together with the command.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Token path.
    pub fn id(&self) -> &CommandId {
        &self.id
    }

    /// Shared handler.
    pub fn handler(&self) -> &Arc<Handler> {
        &self.handler
    }

    /// Description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared aliases.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Returns `true` when both commands share the same handler instance.
    pub fn same_handler(&self, other: &Command) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({})", self.handler.identity())
    }
}

/// Parsed argument values keyed by declared parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs(BTreeMap<String, Value>);

impl ParsedArgs {
    /// Creates an empty set of values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value.
    pub fn insert(&mut self, name: &str, value: Value) {
        self.0.insert(name.to_string(), value);
    }

    /// Raw value, if the parameter exists.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String value, `None` when absent or not a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Boolean value, `false` when absent.
    pub fn get_bool(&self, name: &str) -> bool {
        self.0.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Integer value.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    /// Float value.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the handler takes no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts into a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone().into_iter().collect())
    }
}

impl<const N: usize> From<[(&str, Value); N]> for ParsedArgs {
    fn from(pairs: [(&str, Value); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

/// Everything a handler sees when it runs.
pub struct Invocation<'a> {
    /// The matched command (canonical path, even when invoked by alias).
    pub command: &'a Command,
    /// Parsed argument values.
    pub args: &'a ParsedArgs,
    /// The console that dispatched the command.
    pub console: &'a Console,
}

impl Invocation<'_> {
    /// Console-wide `settings` mapping from configuration.
    pub fn settings(&self) -> &Map<String, Value> {
        self.console.settings()
    }

    /// The service container populated by extensions.
    pub fn core(&self) -> &Core {
        self.console.core()
    }

    /// Interrupt flag; long-running handlers should poll it.
    pub fn interrupt(&self) -> &InterruptFlag {
        self.console.interrupt_flag()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_command_id_rejects_empty() {
        assert_eq!(CommandId::parse(""), Err(BuildError::EmptyCommandId));
        assert_eq!(
            CommandId::from_tokens(vec!["a b".to_string()]),
            Err(BuildError::InvalidIdentifier("a b".to_string()))
        );
    }

    #[test]
    fn test_command_description_trimmed() {
        let command = Command::new("sync", Handler::new("app::sync", |_| Ok(())))
            .unwrap()
            .with_description("\n   Synchronize things");
        assert_eq!(command.description(), Some("Synchronize things"));

        let blank = Command::new("sync", Handler::new("app::sync", |_| Ok(())))
            .unwrap()
            .with_description("   ");
        assert_eq!(blank.description(), None);
    }

    #[test]
    fn test_handler_schema_is_cached() {
        let handler = Handler::new("app::add", |_| Ok(()))
            .param(ParameterDecl::new("a").typed(ValueType::Integer))
            .param(ParameterDecl::new("b").typed(ValueType::Integer));

        let first = handler.schema().unwrap().as_ptr();
        let second = handler.schema().unwrap().as_ptr();
        assert_eq!(first, second);
        assert_eq!(handler.schema().unwrap().len(), 2);
    }

    #[test]
    fn test_parameter_spec_help_text() {
        let spec = ParameterSpec {
            name: "dry_run".to_string(),
            value_type: ValueType::Bool,
            required: false,
            default: Some(json!(false)),
        };
        assert_eq!(spec.help_text(), "[Optional] (bool) dry run");
        assert_eq!(spec.long_name(), "dry-run");
        assert!(spec.is_flag());
    }

    #[test]
    fn test_parsed_args_accessors() {
        let args = ParsedArgs::from([
            ("target", json!("prod")),
            ("dryRun", json!(true)),
            ("count", json!(3)),
        ]);
        assert_eq!(args.get_str("target"), Some("prod"));
        assert!(args.get_bool("dryRun"));
        assert_eq!(args.get_i64("count"), Some(3));
        assert!(!args.get_bool("missing"));
    }
}
