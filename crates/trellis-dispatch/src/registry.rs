//! Controller registry.
//!
//! Maps `(module, controller name)` to a factory building a fresh controller
//! per request. Names are compared in their camelized form, so `user_profiles`,
//! `user-profiles` and `UserProfiles` all address the same controller.
//! Controllers registered in the shared tier (the built-in `pages` and
//! `module` controllers) are reachable from every module.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use trellis_core::utils::text::camelize;
use trellis_core::{TrellisError, TrellisResult};

use crate::builtins::{ModuleController, PagesController};
use crate::controller::Controller;

/// Builds a controller for one request.
pub type ControllerFactory = Arc<dyn Fn() -> Box<dyn Controller> + Send + Sync>;

type Key = (Option<String>, String);

/// The typed lookup table from routing names to controller factories.
///
/// # Examples
///
/// ```
/// use trellis_dispatch::registry::ControllerRegistry;
///
/// let registry = ControllerRegistry::with_builtins();
/// assert!(registry.contains(None, "pages"));
/// assert!(registry.contains(Some("Blog"), "module"));
/// assert!(registry.create(None, "users").is_err());
/// ```
#[derive(Default)]
pub struct ControllerRegistry {
    scoped: HashMap<Key, ControllerFactory>,
    shared: HashMap<String, ControllerFactory>,
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scoped: Vec<String> = self
            .scoped
            .keys()
            .map(|(module, name)| match module {
                Some(module) => format!("{module}:{name}"),
                None => name.clone(),
            })
            .collect();
        scoped.sort();
        let mut shared: Vec<&String> = self.shared.keys().collect();
        shared.sort();
        f.debug_struct("ControllerRegistry")
            .field("scoped", &scoped)
            .field("shared", &shared)
            .finish()
    }
}

impl ControllerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in `pages` and `module` controllers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_shared("pages", || Box::new(PagesController));
        registry.register_shared("module", || Box::new(ModuleController));
        registry
    }

    /// Registers a controller, application-level when `module` is `None`.
    pub fn register<F>(&mut self, module: Option<&str>, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Controller> + Send + Sync + 'static,
    {
        let key = scoped_key(module, name);
        tracing::debug!(module = ?key.0, controller = %key.1, "controller registered");
        self.scoped.insert(key, Arc::new(factory));
    }

    /// Registers a controller visible from every module.
    pub fn register_shared<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Controller> + Send + Sync + 'static,
    {
        self.shared.insert(camelize(name), Arc::new(factory));
    }

    /// Returns `true` if `name` resolves in `module`.
    pub fn contains(&self, module: Option<&str>, name: &str) -> bool {
        self.resolve(module, name).is_ok()
    }

    /// Returns the number of registered controllers, both tiers.
    pub fn len(&self) -> usize {
        self.scoped.len() + self.shared.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds the factory for `name` in `module`, then in the shared tier.
    pub fn resolve(&self, module: Option<&str>, name: &str) -> TrellisResult<ControllerFactory> {
        let key = scoped_key(module, name);
        if key.1.is_empty() {
            return Err(missing(module, &key.1));
        }
        self.scoped
            .get(&key)
            .or_else(|| self.shared.get(&key.1))
            .cloned()
            .ok_or_else(|| missing(module, &key.1))
    }

    /// Builds a fresh controller for `name` in `module`.
    pub fn create(&self, module: Option<&str>, name: &str) -> TrellisResult<Box<dyn Controller>> {
        self.resolve(module, name).map(|factory| factory())
    }
}

fn scoped_key(module: Option<&str>, name: &str) -> Key {
    (module.map(str::to_ascii_lowercase), camelize(name))
}

fn missing(module: Option<&str>, controller: &str) -> TrellisError {
    TrellisError::ControllerMissing {
        module: module.map(String::from),
        controller: controller.to_string(),
    }
}
