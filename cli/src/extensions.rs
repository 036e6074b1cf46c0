//! Extensions shipped with the scaffold binary.

use std::io::{self, Write};

use command_scaffold_core::{
    Command, Core, Extension, ExtensionCatalog, ExtensionResult, Handler, HandlerError,
    Invocation, ParameterDecl, ValueType,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

pub const AUDIT: &str = "scaffold.ext.audit";
pub const GREETER: &str = "scaffold.ext.greeter";

/// Service under which the greeter stores its resolved settings.
pub const GREETER_SERVICE: &str = "scaffold.greeter";

/// Every extension the binary knows about.
pub fn catalog() -> ExtensionCatalog {
    let mut catalog = ExtensionCatalog::new();
    catalog
        .register_default::<Audit>(AUDIT)
        .register_default::<Greeter>(GREETER);
    catalog
}

/// Contributes `audit services`, listing the registered core services.
#[derive(Debug, Default)]
pub struct Audit;

impl Extension for Audit {
    fn initialize(&self, core: &mut Core, _config: Option<Value>) -> ExtensionResult {
        let handler = Handler::new("scaffold::ext::audit::services", run_audit_services);
        core.provide_command(
            Command::new("audit services", handler)?
                .with_description("List services registered by extensions"),
        );
        info!(extension = AUDIT, "audit extension ready");
        Ok(())
    }
}

fn run_audit_services(inv: &Invocation<'_>) -> Result<(), HandlerError> {
    let mut out = io::stdout().lock();
    for id in inv.core().service_ids() {
        writeln!(out, "{id}")?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GreeterSettings {
    pub greeting: String,
    pub punctuation: String,
}

impl GreeterSettings {
    pub fn render(&self, name: &str) -> String {
        format!("{}, {name}{}", self.greeting, self.punctuation)
    }
}

/// Contributes `greet`, configured by the `greeter` section.
#[derive(Debug, Default)]
pub struct Greeter;

impl Extension for Greeter {
    fn config_key(&self) -> Option<&str> {
        Some("greeter")
    }

    fn dependencies(&self) -> Vec<String> {
        vec![AUDIT.to_string()]
    }

    fn default_settings(&self) -> Option<Value> {
        Some(json!({"greeting": "hello", "punctuation": "!"}))
    }

    fn initialize(&self, core: &mut Core, config: Option<Value>) -> ExtensionResult {
        let raw = config
            .or_else(|| self.default_settings())
            .unwrap_or_default();
        let settings: GreeterSettings = serde_json::from_value(raw)?;
        core.register_service(GREETER_SERVICE, settings);

        let handler = Handler::new("scaffold::ext::greeter::greet", run_greet).param(
            ParameterDecl::new("name")
                .typed(ValueType::String)
                .with_default(json!("world")),
        );
        core.provide_command(Command::new("greet", handler)?.with_description("Print a greeting"));
        Ok(())
    }
}

fn run_greet(inv: &Invocation<'_>) -> Result<(), HandlerError> {
    let Some(settings) = inv.core().service::<GreeterSettings>(GREETER_SERVICE) else {
        return Err(HandlerError::failed("greeter settings are not registered"));
    };
    let name = inv.args.get_str("name").unwrap_or("world");
    println!("{}", settings.render(name));
    Ok(())
}
