mod builtin;
mod extensions;
mod sample;

use command_scaffold_config::{CONFIG_ENV, ConfigLoader, locate};
use command_scaffold_core::{
    CommandCatalog, Console, ImportSource, InterruptFlag, Outcome, ServiceSource,
    process_debug_requested,
};
use serde_json::{Value, json};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const ABOUT: &str = "Configurable command console with pluggable modules and extensions";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    init_logging(process_debug_requested(&args));

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(Outcome::StartupFailed.exit_code());
        }
    };

    let interrupt = InterruptFlag::new();
    let flag = interrupt.clone();
    if let Err(err) = ctrlc::set_handler(move || flag.trigger()) {
        warn!("failed to install Ctrl-C handler: {err}");
    }

    let console = match build_console(&config, interrupt) {
        Ok(console) => console,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(Outcome::StartupFailed.exit_code());
        }
    };

    let outcome = console.run(args);
    debug!(?outcome, "dispatch finished");
    std::process::exit(outcome.exit_code());
}

fn init_logging(process_debug: bool) {
    let env_filter = if process_debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        eprintln!("failed to initialize logging: {err}");
    }
}

fn default_config() -> Value {
    json!({
        "imports": [builtin::MODULE],
        "services": [],
    })
}

/// Builtins, then the located configuration file, if any.
fn load_config() -> command_scaffold_config::Result<Value> {
    let explicit = std::env::var(CONFIG_ENV).ok();
    let mut loader = ConfigLoader::new().value(default_config());
    if let Some(path) = locate(explicit.as_deref(), std::path::Path::new(".")) {
        debug!(path = %path.display(), "using configuration file");
        loader = loader.file(path);
    }
    loader.build()
}

fn build_console(
    config: &Value,
    interrupt: InterruptFlag,
) -> Result<Console, Box<dyn std::error::Error>> {
    let mut commands = CommandCatalog::new();
    builtin::register(&mut commands)?;
    sample::register(&mut commands)?;
    let imports = ImportSource::new(commands);

    let mut console = Console::new("scaffold")
        .with_about(ABOUT)
        .with_interrupt(interrupt);
    console
        .core_mut()
        .register_service(builtin::CONFIG_SERVICE, config.clone());
    console.activate(config, &extensions::catalog(), &[&imports, &ServiceSource])?;
    Ok(console)
}
