//! Demonstration commands (module `scaffold.sample`).

use std::io::{self, Write};

use command_scaffold_core::{
    BuildError, Command, CommandCatalog, Handler, HandlerError, Invocation, ParameterDecl,
    ValueType,
};
use serde_json::json;

pub const MODULE: &str = "scaffold.sample";

const MIGRATION_STEPS: &[&str] = &["schema", "data", "indexes"];

/// Adds the sample commands to `catalog`.
pub fn register(catalog: &mut CommandCatalog) -> Result<(), BuildError> {
    let migrate = Handler::new("scaffold::sample::migrate", run_migrate)
        .param(ParameterDecl::new("target").typed(ValueType::String))
        .param(
            ParameterDecl::new("dryRun")
                .typed(ValueType::Bool)
                .with_default(json!(false)),
        );
    let add = Handler::new("scaffold::sample::add", run_add)
        .param(ParameterDecl::new("a").typed(ValueType::Integer))
        .param(ParameterDecl::new("b").typed(ValueType::Integer));
    let auth = Handler::new("scaffold::sample::auth", run_auth).param(ParameterDecl::new("name"));

    catalog
        .register(
            MODULE,
            Command::new("db migrate", migrate)?
                .with_description("Run database migrations")
                .with_alias("mdb"),
        )
        .register(
            MODULE,
            Command::new("add", add)?.with_description("Add two integers"),
        )
        .register(
            MODULE,
            Command::new("auth", auth)?.with_description("Sign in as a user"),
        );
    Ok(())
}

fn run_migrate(inv: &Invocation<'_>) -> Result<(), HandlerError> {
    let target = inv.args.get_str("target").unwrap_or_default();
    let dry_run = inv.args.get_bool("dryRun");
    let mut out = io::stdout().lock();

    for step in MIGRATION_STEPS {
        if inv.interrupt().is_set() {
            return Err(HandlerError::Interrupted);
        }
        if dry_run {
            writeln!(out, "[dry run] would migrate {step} on {target}")?;
        } else {
            writeln!(out, "migrated {step} on {target}")?;
        }
    }
    Ok(())
}

fn run_add(inv: &Invocation<'_>) -> Result<(), HandlerError> {
    let (Some(a), Some(b)) = (inv.args.get_i64("a"), inv.args.get_i64("b")) else {
        return Err(HandlerError::failed("both operands are required"));
    };
    let sum = a
        .checked_add(b)
        .ok_or_else(|| HandlerError::failed(format!("{a} + {b} overflows")))?;
    println!("{sum}");
    Ok(())
}

fn run_auth(inv: &Invocation<'_>) -> Result<(), HandlerError> {
    let name = inv.args.get_str("name").unwrap_or_default().trim();
    if name.is_empty() {
        return Err(HandlerError::EmptyResponse("name".to_string()));
    }
    let region = inv
        .settings()
        .get("region")
        .and_then(|v| v.as_str())
        .unwrap_or("default");
    println!("Signed in as {name} (region {region})");
    Ok(())
}
