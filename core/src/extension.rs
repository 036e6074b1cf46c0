//! Extension declaration, catalog and dependency-ordered activation.
//!
//! Extensions are looked up by name in an [`ExtensionCatalog`] and activated
//! through an [`ExtensionGraph`], which walks declared dependencies depth
//! first so every dependency initializes before its dependents. Each
//! extension is instantiated and initialized at most once per graph, no
//! matter how many activation calls name it.
//!
//! # Examples
//!
//! ```
//! use command_scaffold_core::*;
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct Cache;
//!
//! impl Extension for Cache {
//!     fn config_key(&self) -> Option<&str> {
//!         Some("cache")
//!     }
//!
//!     fn default_settings(&self) -> Option<serde_json::Value> {
//!         Some(json!({"size": 64}))
//!     }
//!
//!     fn initialize(&self, core: &mut Core, config: Option<serde_json::Value>) -> ExtensionResult {
//!         core.register_service("cache.settings", config.unwrap_or_default());
//!         Ok(())
//!     }
//! }
//!
//! let mut catalog = ExtensionCatalog::new();
//! catalog.register_default::<Cache>("app.cache");
//!
//! let mut graph = ExtensionGraph::new();
//! let mut core = Core::new();
//! let activated = graph
//!     .activate_all(&["app.cache".to_string()], &catalog, &mut core, &json!({}))
//!     .unwrap();
//!
//! assert_eq!(activated, vec!["app.cache"]);
//! let settings = core.service::<serde_json::Value>("cache.settings").unwrap();
//! assert_eq!(*settings, json!({"size": 64}));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::container::Core;
use crate::error::ActivationError;
use crate::merge::value_kind;

/// Return type of [`Extension::initialize`].
pub type ExtensionResult = Result<(), Box<dyn Error + Send + Sync>>;

/// A pluggable initializer.
pub trait Extension: Send + Sync {
    /// Top-level configuration key this extension reads, if any.
    fn config_key(&self) -> Option<&str> {
        None
    }

    /// Names of extensions that must be active first, in activation order.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Settings used when the configuration key is absent. When a mapping,
    /// missing keys of a supplied mapping are filled from it.
    fn default_settings(&self) -> Option<Value> {
        None
    }

    /// Registers services or commands into `core`.
    fn initialize(&self, core: &mut Core, config: Option<Value>) -> ExtensionResult;
}

type Factory = dyn Fn() -> Box<dyn Extension> + Send + Sync;

/// Extension factories keyed by name.
#[derive(Clone, Default)]
pub struct ExtensionCatalog {
    factories: BTreeMap<String, Arc<Factory>>,
}

impl ExtensionCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Extension> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
        self
    }

    /// Registers an extension type built with [`Default`].
    pub fn register_default<E>(&mut self, name: &str) -> &mut Self
    where
        E: Extension + Default + 'static,
    {
        self.register(name, || Box::new(E::default()))
    }

    /// Instantiates the extension registered under `name`.
    pub fn create(&self, name: &str) -> Option<Box<dyn Extension>> {
        self.factories.get(name).map(|factory| factory())
    }
}

impl fmt::Debug for ExtensionCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionCatalog")
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InProgress,
    Done,
}

/// Tracks which extensions have been activated.
#[derive(Default)]
pub struct ExtensionGraph {
    states: HashMap<String, State>,
    order: Vec<String>,
    instances: Vec<Box<dyn Extension>>,
}

impl ExtensionGraph {
    /// Creates a graph with nothing activated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates `names` in order, dependencies first.
    ///
    /// Extensions already active are skipped. Returns the names activated by
    /// this call, in activation order.
    ///
    /// # Errors
    ///
    /// - [`ActivationError::UnknownExtension`] for a name not in `catalog`.
    /// - [`ActivationError::CyclicDependency`] when a dependency chain
    ///   re-enters an extension that is still activating.
    /// - [`ActivationError::ConfigTypeMismatch`] and
    ///   [`ActivationError::MissingConfiguration`] from settings resolution.
    /// - [`ActivationError::Initialization`] when `initialize` fails.
    ///
    /// Extensions fully activated before the error stay active.
    pub fn activate_all(
        &mut self,
        names: &[String],
        catalog: &ExtensionCatalog,
        core: &mut Core,
        config: &Value,
    ) -> Result<Vec<String>, ActivationError> {
        let mut activated = Vec::new();
        let mut chain = Vec::new();
        for name in names {
            self.visit(name, catalog, core, config, &mut chain, &mut activated)?;
        }
        Ok(activated)
    }

    fn visit(
        &mut self,
        name: &str,
        catalog: &ExtensionCatalog,
        core: &mut Core,
        config: &Value,
        chain: &mut Vec<String>,
        activated: &mut Vec<String>,
    ) -> Result<(), ActivationError> {
        match self.states.get(name) {
            Some(State::Done) => return Ok(()),
            Some(State::InProgress) => {
                let start = chain.iter().position(|n| n == name).unwrap_or(0);
                let mut cycle = chain[start..].to_vec();
                cycle.push(name.to_string());
                return Err(ActivationError::CyclicDependency { chain: cycle });
            }
            None => {}
        }

        let extension = catalog
            .create(name)
            .ok_or_else(|| ActivationError::UnknownExtension(name.to_string()))?;

        self.states.insert(name.to_string(), State::InProgress);
        chain.push(name.to_string());
        let result =
            self.initialize_with_dependencies(name, extension.as_ref(), catalog, core, config, chain, activated);
        chain.pop();

        match result {
            Ok(()) => {
                self.states.insert(name.to_string(), State::Done);
                self.order.push(name.to_string());
                self.instances.push(extension);
                activated.push(name.to_string());
                info!(extension = name, "activated extension");
                Ok(())
            }
            Err(err) => {
                self.states.remove(name);
                Err(err)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn initialize_with_dependencies(
        &mut self,
        name: &str,
        extension: &dyn Extension,
        catalog: &ExtensionCatalog,
        core: &mut Core,
        config: &Value,
        chain: &mut Vec<String>,
        activated: &mut Vec<String>,
    ) -> Result<(), ActivationError> {
        for dependency in extension.dependencies() {
            debug!(extension = name, dependency = %dependency, "activating dependency");
            self.visit(&dependency, catalog, core, config, chain, activated)?;
        }

        let settings = resolve_settings(name, extension, config)?;
        extension
            .initialize(core, settings)
            .map_err(|source| ActivationError::Initialization {
                extension: name.to_string(),
                source,
            })
    }

    /// Returns `true` once `name` is fully activated.
    pub fn is_active(&self, name: &str) -> bool {
        self.states.get(name) == Some(&State::Done)
    }

    /// Activated extension names in activation order.
    pub fn activated(&self) -> &[String] {
        &self.order
    }
}

impl fmt::Debug for ExtensionGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionGraph")
            .field("activated", &self.order)
            .field("instances", &self.instances.len())
            .finish_non_exhaustive()
    }
}

/// Settings passed to `initialize` for `extension`, read from `config`.
///
/// A `null` value counts as absent.
///
/// # Errors
///
/// [`ActivationError::ConfigTypeMismatch`] when the supplied value and the
/// defaults have different kinds, and
/// [`ActivationError::MissingConfiguration`] when the key is absent and no
/// defaults exist.
pub fn resolve_settings(
    name: &str,
    extension: &dyn Extension,
    config: &Value,
) -> Result<Option<Value>, ActivationError> {
    let Some(key) = extension.config_key() else {
        return Ok(None);
    };
    let defaults = extension.default_settings();
    let supplied = config.get(key).filter(|value| !value.is_null()).cloned();

    match (supplied, defaults) {
        (None, Some(defaults)) => Ok(Some(defaults)),
        (None, None) => Err(ActivationError::MissingConfiguration {
            extension: name.to_string(),
            key: key.to_string(),
        }),
        (Some(supplied), None) => Ok(Some(supplied)),
        (Some(supplied), Some(defaults)) => {
            let (expected, actual) = (value_kind(&defaults), value_kind(&supplied));
            if expected != actual {
                return Err(ActivationError::ConfigTypeMismatch {
                    extension: name.to_string(),
                    key: key.to_string(),
                    expected,
                    actual,
                });
            }
            match (supplied, defaults) {
                (Value::Object(mut supplied), Value::Object(defaults)) => {
                    for (k, v) in defaults {
                        supplied.entry(k).or_insert(v);
                    }
                    Ok(Some(Value::Object(supplied)))
                }
                (supplied, _) => Ok(Some(supplied)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        name: String,
        dependencies: Vec<String>,
        key: Option<String>,
        defaults: Option<Value>,
        log: Log,
    }

    impl Extension for Recorder {
        fn config_key(&self) -> Option<&str> {
            self.key.as_deref()
        }

        fn dependencies(&self) -> Vec<String> {
            self.dependencies.clone()
        }

        fn default_settings(&self) -> Option<Value> {
            self.defaults.clone()
        }

        fn initialize(&self, core: &mut Core, config: Option<Value>) -> ExtensionResult {
            self.log.lock().unwrap().push(self.name.clone());
            if let Some(config) = config {
                core.register_service(&self.name, config);
            }
            Ok(())
        }
    }

    fn register(catalog: &mut ExtensionCatalog, log: &Log, name: &str, deps: &[&str]) {
        register_with(catalog, log, name, deps, None, None);
    }

    fn register_with(
        catalog: &mut ExtensionCatalog,
        log: &Log,
        name: &str,
        deps: &[&str],
        key: Option<&str>,
        defaults: Option<Value>,
    ) {
        let log = Arc::clone(log);
        let id = name.to_string();
        let deps: Vec<String> = deps.iter().map(|d| d.to_string()).collect();
        let key = key.map(String::from);
        catalog.register(name, move || {
            Box::new(Recorder {
                name: id.clone(),
                dependencies: deps.clone(),
                key: key.clone(),
                defaults: defaults.clone(),
                log: Arc::clone(&log),
            })
        });
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    fn graph_ab() -> (ExtensionCatalog, Log) {
        let log = Log::default();
        let mut catalog = ExtensionCatalog::new();
        register(&mut catalog, &log, "a", &[]);
        register(&mut catalog, &log, "b", &["a"]);
        (catalog, log)
    }

    #[test]
    fn test_dependency_activates_first() {
        let (catalog, log) = graph_ab();
        let mut graph = ExtensionGraph::new();
        let activated = graph
            .activate_all(&names(&["b"]), &catalog, &mut Core::new(), &json!({}))
            .unwrap();

        assert_eq!(activated, vec!["a", "b"]);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_each_extension_activates_once_in_any_order() {
        for order in [["b", "a"], ["a", "b"]] {
            let (catalog, log) = graph_ab();
            let mut graph = ExtensionGraph::new();
            graph
                .activate_all(&names(&order), &catalog, &mut Core::new(), &json!({}))
                .unwrap();
            assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
            assert_eq!(graph.activated(), ["a", "b"]);
        }
    }

    #[test]
    fn test_repeated_activation_is_idempotent() {
        let (catalog, log) = graph_ab();
        let mut graph = ExtensionGraph::new();
        let mut core = Core::new();
        graph
            .activate_all(&names(&["a"]), &catalog, &mut core, &json!({}))
            .unwrap();
        let second = graph
            .activate_all(&names(&["b", "a"]), &catalog, &mut core, &json!({}))
            .unwrap();

        assert_eq!(second, vec!["b"]);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
        assert!(graph.is_active("a") && graph.is_active("b"));
    }

    #[test]
    fn test_self_cycle_detected() {
        let log = Log::default();
        let mut catalog = ExtensionCatalog::new();
        register(&mut catalog, &log, "loop", &["loop"]);

        let err = ExtensionGraph::new()
            .activate_all(&names(&["loop"]), &catalog, &mut Core::new(), &json!({}))
            .unwrap_err();
        assert!(matches!(
            err,
            ActivationError::CyclicDependency { ref chain } if chain == &["loop", "loop"]
        ));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_mutual_cycle_detected() {
        let log = Log::default();
        let mut catalog = ExtensionCatalog::new();
        register(&mut catalog, &log, "x", &["y"]);
        register(&mut catalog, &log, "y", &["x"]);

        let mut graph = ExtensionGraph::new();
        let err = graph
            .activate_all(&names(&["x"]), &catalog, &mut Core::new(), &json!({}))
            .unwrap_err();
        assert!(matches!(
            err,
            ActivationError::CyclicDependency { ref chain } if chain == &["x", "y", "x"]
        ));
        assert!(!graph.is_active("x") && !graph.is_active("y"));
    }

    #[test]
    fn test_unknown_extension() {
        let err = ExtensionGraph::new()
            .activate_all(
                &names(&["missing"]),
                &ExtensionCatalog::new(),
                &mut Core::new(),
                &json!({}),
            )
            .unwrap_err();
        assert!(matches!(err, ActivationError::UnknownExtension(ref n) if n == "missing"));
    }

    #[test]
    fn test_config_type_mismatch() {
        let log = Log::default();
        let mut catalog = ExtensionCatalog::new();
        register_with(&mut catalog, &log, "orm", &[], Some("orm"), Some(json!({"url": "x"})));

        let err = ExtensionGraph::new()
            .activate_all(&names(&["orm"]), &catalog, &mut Core::new(), &json!({"orm": ["x"]}))
            .unwrap_err();
        assert!(matches!(
            err,
            ActivationError::ConfigTypeMismatch { expected: "mapping", actual: "sequence", .. }
        ));
    }

    #[test]
    fn test_defaults_fill_missing_keys() {
        let log = Log::default();
        let mut catalog = ExtensionCatalog::new();
        register_with(
            &mut catalog,
            &log,
            "orm",
            &[],
            Some("orm"),
            Some(json!({"url": "sqlite://", "pool": 4})),
        );

        let mut core = Core::new();
        ExtensionGraph::new()
            .activate_all(
                &names(&["orm"]),
                &catalog,
                &mut core,
                &json!({"orm": {"url": "postgres://"}}),
            )
            .unwrap();

        let settings = core.service::<Value>("orm").unwrap();
        assert_eq!(*settings, json!({"url": "postgres://", "pool": 4}));
    }

    #[test]
    fn test_absent_config_uses_defaults_or_fails() {
        let log = Log::default();
        let mut catalog = ExtensionCatalog::new();
        register_with(&mut catalog, &log, "with", &[], Some("with"), Some(json!(3)));
        register_with(&mut catalog, &log, "without", &[], Some("without"), None);

        let mut core = Core::new();
        let mut graph = ExtensionGraph::new();
        graph
            .activate_all(&names(&["with"]), &catalog, &mut core, &json!({"with": null}))
            .unwrap();
        assert_eq!(*core.service::<Value>("with").unwrap(), json!(3));

        let err = graph
            .activate_all(&names(&["without"]), &catalog, &mut core, &json!({}))
            .unwrap_err();
        assert!(matches!(err, ActivationError::MissingConfiguration { ref key, .. } if key == "without"));
    }
}
