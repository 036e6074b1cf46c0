//! Command sources: producers of commands claimed by a configuration section.
//!
//! [`ImportSource`] reads the `imports` section, a list of module names
//! resolved against a [`CommandCatalog`]. [`ServiceSource`] reads the
//! `services` section and yields commands contributed by active extensions.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::container::Core;
use crate::error::BuildError;
use crate::types::Command;
use crate::validate::split_identifier;

/// Produces commands from one configuration section.
pub trait CommandSource {
    /// Top-level configuration key this source claims.
    fn section_name(&self) -> &str;

    /// Commands described by `section`, the value stored under
    /// [`section_name`](Self::section_name).
    fn commands(&self, section: &Value, core: &Core) -> Result<Vec<Command>, BuildError>;
}

/// Commands grouped by module name.
///
/// # Examples
///
/// ```
/// use command_scaffold_core::*;
/// use serde_json::json;
///
/// let mut catalog = CommandCatalog::new();
/// catalog.register(
///     "app.commands",
///     Command::new("auth", Handler::new("app::auth", |_| Ok(()))).unwrap(),
/// );
///
/// let source = ImportSource::new(catalog);
/// let commands = source.commands(&json!(["app.commands"]), &Core::new()).unwrap();
/// assert_eq!(commands.len(), 1);
///
/// assert!(matches!(
///     source.commands(&json!(["app.missing"]), &Core::new()),
///     Err(BuildError::UnknownModule(_))
/// ));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandCatalog {
    modules: BTreeMap<String, Vec<Command>>,
}

impl CommandCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `command` to `module`.
    pub fn register(&mut self, module: &str, command: Command) -> &mut Self {
        self.modules
            .entry(module.to_string())
            .or_default()
            .push(command);
        self
    }

    /// Commands of `module`, in registration order.
    pub fn module(&self, module: &str) -> Option<&[Command]> {
        self.modules.get(module).map(Vec::as_slice)
    }
}

/// Loads commands for the module names listed under `imports`.
#[derive(Debug, Clone, Default)]
pub struct ImportSource {
    catalog: CommandCatalog,
}

impl ImportSource {
    /// Creates a source resolving names against `catalog`.
    pub fn new(catalog: CommandCatalog) -> Self {
        Self { catalog }
    }
}

impl CommandSource for ImportSource {
    fn section_name(&self) -> &str {
        "imports"
    }

    fn commands(&self, section: &Value, _core: &Core) -> Result<Vec<Command>, BuildError> {
        let names = string_list(self.section_name(), section)?;
        if names.is_empty() {
            warn!(section = self.section_name(), "command source section is empty");
        }

        let mut commands = Vec::new();
        for name in names {
            let module = self
                .catalog
                .module(name)
                .ok_or_else(|| BuildError::UnknownModule(name.to_string()))?;
            debug!(module = name, commands = module.len(), "imported module");
            commands.extend(module.iter().cloned());
        }
        Ok(commands)
    }
}

/// Loads commands contributed to the [`Core`] by active extensions.
///
/// An empty `services` list selects every contributed command; otherwise only
/// the listed command identifiers are loaded, and each must have been
/// contributed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceSource;

impl CommandSource for ServiceSource {
    fn section_name(&self) -> &str {
        "services"
    }

    fn commands(&self, section: &Value, core: &Core) -> Result<Vec<Command>, BuildError> {
        let names = string_list(self.section_name(), section)?;
        let provided = core.provided_commands();
        if names.is_empty() {
            return Ok(provided.to_vec());
        }

        names
            .into_iter()
            .map(|name| {
                provided
                    .iter()
                    .find(|command| split_identifier(name).as_slice() == command.id().tokens())
                    .cloned()
                    .ok_or_else(|| BuildError::InvalidSection {
                        section: self.section_name().to_string(),
                        reason: format!("no active extension provides \"{name}\""),
                    })
            })
            .collect()
    }
}

fn string_list<'v>(section: &str, value: &'v Value) -> Result<Vec<&'v str>, BuildError> {
    let invalid = |reason: &str| BuildError::InvalidSection {
        section: section.to_string(),
        reason: reason.to_string(),
    };

    value
        .as_array()
        .ok_or_else(|| invalid("expected a list of names"))?
        .iter()
        .map(|item| item.as_str().ok_or_else(|| invalid("every entry must be a string")))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::types::Handler;

    use super::*;

    fn command(id: &str) -> Command {
        Command::new(id, Handler::new(&format!("test::{id}"), |_| Ok(()))).unwrap()
    }

    #[test]
    fn test_import_source_preserves_listing_order() {
        let mut catalog = CommandCatalog::new();
        catalog.register("m.one", command("b")).register("m.one", command("a"));
        catalog.register("m.two", command("c"));

        let ids: Vec<String> = ImportSource::new(catalog)
            .commands(&json!(["m.two", "m.one"]), &Core::new())
            .unwrap()
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_import_source_rejects_bad_shapes() {
        let source = ImportSource::default();
        assert!(matches!(
            source.commands(&json!("m.one"), &Core::new()),
            Err(BuildError::InvalidSection { .. })
        ));
        assert!(matches!(
            source.commands(&json!([1]), &Core::new()),
            Err(BuildError::InvalidSection { .. })
        ));
    }

    #[test]
    fn test_service_source_selects_provided_commands() {
        let mut core = Core::new();
        core.provide_command(command("greet"));
        core.provide_command(command("audit log"));

        let all = ServiceSource.commands(&json!([]), &core).unwrap();
        assert_eq!(all.len(), 2);

        let picked = ServiceSource.commands(&json!(["audit.log"]), &core).unwrap();
        assert_eq!(picked[0].id().to_string(), "audit log");

        assert!(matches!(
            ServiceSource.commands(&json!(["missing"]), &core),
            Err(BuildError::InvalidSection { .. })
        ));
    }
}
