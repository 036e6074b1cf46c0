//! Commands every scaffold console ships with (module `scaffold.builtin`).

use std::io::{self, Write};
use std::path::PathBuf;

use command_scaffold_config::{AppConfig, ConfigError, Format};
use command_scaffold_core::{
    BuildError, Command, CommandCatalog, Handler, HandlerError, Invocation, ParameterDecl,
    ValueType,
};
use serde_json::{Value, json};

/// Module name used in the `imports` section.
pub const MODULE: &str = "scaffold.builtin";

/// Core service holding the merged configuration the console started from.
pub const CONFIG_SERVICE: &str = "scaffold.config";

const DEFAULT_IMPORTS: &[&str] = &["scaffold.sample"];

/// Adds the builtin commands to `catalog`.
pub fn register(catalog: &mut CommandCatalog) -> Result<(), BuildError> {
    catalog
        .register(MODULE, init_command()?)
        .register(MODULE, config_show_command()?)
        .register(MODULE, commands_list_command()?)
        .register(MODULE, extensions_list_command()?);
    Ok(())
}

fn format_choice() -> ValueType {
    ValueType::Choice(vec!["json".to_string(), "yaml".to_string()])
}

fn init_command() -> Result<Command, BuildError> {
    let handler = Handler::new("scaffold::builtin::init", run_init)
        .param(
            ParameterDecl::new("output")
                .typed(ValueType::String)
                .with_default(json!("cli.json")),
        )
        .param(ParameterDecl::new("format").optional(format_choice()))
        .param(ParameterDecl::new("imports").optional(ValueType::String))
        .param(ParameterDecl::new("extensions").optional(ValueType::String))
        .param(ParameterDecl::new("force").typed(ValueType::Bool));
    Ok(Command::new("init", handler)?.with_description("Write a starter configuration file"))
}

fn config_show_command() -> Result<Command, BuildError> {
    let handler = Handler::new("scaffold::builtin::config_show", run_config_show)
        .param(ParameterDecl::new("format").typed(format_choice()).with_default(json!("yaml")));
    Ok(Command::new("config show", handler)?.with_description("Print the merged configuration"))
}

fn commands_list_command() -> Result<Command, BuildError> {
    let handler = Handler::new("scaffold::builtin::commands_list", run_commands_list);
    Ok(Command::new("commands list", handler)?
        .with_description("List registered commands and their aliases")
        .with_alias("ls"))
}

fn extensions_list_command() -> Result<Command, BuildError> {
    let handler = Handler::new("scaffold::builtin::extensions_list", run_extensions_list);
    Ok(Command::new("extensions list", handler)?
        .with_description("List activated extensions in activation order"))
}

fn config_error(err: ConfigError) -> HandlerError {
    HandlerError::Other(Box::new(err))
}

/// Splits a comma separated option value, dropping empty entries.
pub fn parse_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Starter configuration written by `init`.
pub fn starter_config(imports: Vec<String>, extensions: Vec<String>) -> AppConfig {
    let imports = if imports.is_empty() {
        DEFAULT_IMPORTS.iter().map(|s| s.to_string()).collect()
    } else {
        imports
    };
    AppConfig {
        extensions,
        imports,
        services: Some(Vec::new()),
        ..AppConfig::default()
    }
}

fn run_init(inv: &Invocation<'_>) -> Result<(), HandlerError> {
    let output = inv.args.get_str("output").unwrap_or_default().trim();
    if output.is_empty() {
        return Err(HandlerError::EmptyResponse("output".to_string()));
    }
    let path = PathBuf::from(output);

    let format = match inv.args.get_str("format") {
        Some("json") => Format::Json,
        Some("yaml") => Format::Yaml,
        _ => Format::from_path(&path).map_err(config_error)?,
    };
    if path.exists() && !inv.args.get_bool("force") {
        return Err(HandlerError::failed(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let config = starter_config(
        parse_list(inv.args.get_str("imports")),
        parse_list(inv.args.get_str("extensions")),
    );
    let file = std::fs::File::create(&path)?;
    format
        .write(io::BufWriter::new(file), &config)
        .map_err(config_error)?;

    tracing::info!(path = %path.display(), ?format, "wrote starter configuration");
    println!("Wrote {}", path.display());
    Ok(())
}

fn run_config_show(inv: &Invocation<'_>) -> Result<(), HandlerError> {
    let Some(config) = inv.core().service::<Value>(CONFIG_SERVICE) else {
        return Err(HandlerError::failed("no configuration loaded"));
    };
    let format = match inv.args.get_str("format") {
        Some("json") => Format::Json,
        _ => Format::Yaml,
    };
    format
        .write(io::stdout().lock(), config.as_ref())
        .map_err(config_error)
}

fn run_commands_list(inv: &Invocation<'_>) -> Result<(), HandlerError> {
    let console = inv.console;
    let mut out = io::stdout().lock();

    for command in console.tree().commands() {
        let id = command.id().to_string();
        let mut line = format!("{id:<20} {}", command.description().unwrap_or(""));
        let aliases = console.aliases().aliases_of(command.id());
        if !aliases.is_empty() {
            line.push_str(&format!(" (aliases: {})", aliases.join(", ")));
        }
        writeln!(out, "{}", line.trim_end())?;
    }
    Ok(())
}

fn run_extensions_list(inv: &Invocation<'_>) -> Result<(), HandlerError> {
    let activated = inv.console.activated_extensions();
    let mut out = io::stdout().lock();
    if activated.is_empty() {
        writeln!(out, "No extensions activated")?;
    }
    for name in activated {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use command_scaffold_core::{Console, ExtensionCatalog, ImportSource};

    use super::*;

    #[test]
    fn test_register_adds_all_builtins() {
        let mut catalog = CommandCatalog::new();
        register(&mut catalog).unwrap();

        let ids: Vec<String> = catalog
            .module(MODULE)
            .unwrap()
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        assert_eq!(ids, vec!["init", "config show", "commands list", "extensions list"]);
    }

    #[test]
    fn test_ls_alias_resolves_to_commands_list() {
        let mut catalog = CommandCatalog::new();
        register(&mut catalog).unwrap();
        let imports = ImportSource::new(catalog);

        let mut console = Console::new("scaffold");
        console
            .activate(&json!({"imports": [MODULE]}), &ExtensionCatalog::new(), &[&imports])
            .unwrap();

        let target = console.aliases().resolve("ls").unwrap();
        assert_eq!(target.to_string(), "commands list");
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(Some("a, b,,c ")), vec!["a", "b", "c"]);
        assert!(parse_list(Some(" , ")).is_empty());
        assert!(parse_list(None).is_empty());
    }

    #[test]
    fn test_starter_config_defaults_imports() {
        let config = starter_config(Vec::new(), vec!["scaffold.ext.greeter".to_string()]);
        assert_eq!(config.imports, vec!["scaffold.sample"]);
        assert_eq!(config.services, Some(Vec::new()));
        assert_eq!(
            config.to_value().unwrap(),
            json!({
                "extensions": ["scaffold.ext.greeter"],
                "services": [],
                "imports": ["scaffold.sample"]
            })
        );
    }
}
