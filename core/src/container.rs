//! Service container shared between extensions and command handlers.
//!
//! Extensions receive `&mut Core` while they initialize and may register
//! services or contribute commands. Handlers get read access through
//! [`Invocation::core`](crate::Invocation::core).

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::types::Command;

type Service = Arc<dyn Any + Send + Sync>;

/// Keyed registry of services plus commands contributed by extensions.
///
/// # Examples
///
/// ```
/// use command_scaffold_core::Core;
///
/// let mut core = Core::new();
/// core.register_service("greeting", String::from("hello"));
///
/// let greeting = core.service::<String>("greeting").unwrap();
/// assert_eq!(greeting.as_str(), "hello");
/// assert!(core.service::<u32>("greeting").is_none());
/// ```
#[derive(Default)]
pub struct Core {
    services: BTreeMap<String, Service>,
    commands: Vec<Command>,
}

impl Core {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `service` under `id`, returning `true` if it replaced one.
    pub fn register_service<T>(&mut self, id: &str, service: T) -> bool
    where
        T: Any + Send + Sync,
    {
        debug!(service = id, "registered service");
        self.services
            .insert(id.to_string(), Arc::new(service))
            .is_some()
    }

    /// Service registered under `id`, if it has type `T`.
    pub fn service<T>(&self, id: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.services.get(id)?.clone().downcast::<T>().ok()
    }

    /// Returns `true` when a service is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.services.contains_key(id)
    }

    /// Service identifiers in sorted order.
    pub fn service_ids(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// Contributes a command, picked up by the `services` command source.
    pub fn provide_command(&mut self, command: Command) {
        debug!(id = %command.id(), "command provided by extension");
        self.commands.push(command);
    }

    /// Commands contributed so far, in contribution order.
    pub fn provided_commands(&self) -> &[Command] {
        &self.commands
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .field("commands", &self.commands.len())
            .finish()
    }
}
