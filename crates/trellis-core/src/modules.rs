//! Module registry for the trellis framework.
//!
//! A module is a dotted-name (`Parent.Child`) subdivision of the application
//! with its own controllers, views and webroot, laid out as nested directories.
//! Modules are known either because they were declared at bootstrap or because
//! a matching directory exists under the configured modules root.
//!
//! Loading is lazy, idempotent and one-way: the first [`ModuleRegistry::load`]
//! registers the module's search roots, later calls are no-ops. The registry is
//! constructed once at startup and shared by reference (`Arc<ModuleRegistry>`)
//! between the router, the asset resolver and the dispatcher.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::settings::Settings;
use crate::utils::text::camelize;

/// Directory names inside a module tree that never name a child module.
const RESERVED_DIRS: &[&str] = &["webroot", "views", "controllers", "config"];

/// A module declared explicitly at bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDefinition {
    /// Dotted module name, e.g. `Sales.Reports`.
    pub name: String,
    /// Root directory of the module.
    pub root: PathBuf,
}

impl ModuleDefinition {
    /// Creates a new definition.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// Returns the dotted components of the module name.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.name.split('.')
    }

}

/// The process-wide registry of known and loaded modules.
///
/// # Examples
///
/// ```
/// use trellis_core::modules::{ModuleDefinition, ModuleRegistry};
///
/// let mut registry = ModuleRegistry::new();
/// registry.declare(ModuleDefinition::new("Reports", "/srv/app/modules/Reports"));
///
/// assert_eq!(registry.find("/reports/monthly").as_deref(), Some("Reports"));
/// assert!(registry.load("Reports"));
/// assert!(registry.loaded("Reports"));
/// ```
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules_root: Option<PathBuf>,
    declared: Vec<ModuleDefinition>,
    loaded: RwLock<HashMap<String, Vec<PathBuf>>>,
}

impl ModuleRegistry {
    /// Creates a new, empty registry with no discovery root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry discovering modules under `root`.
    pub fn with_modules_root(root: impl Into<PathBuf>) -> Self {
        Self {
            modules_root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Builds a registry from the modules root and declared modules in `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut registry = Self {
            modules_root: settings.modules_root.clone(),
            ..Self::default()
        };
        for module in &settings.modules {
            registry.declare(ModuleDefinition::new(&module.name, &module.path));
        }
        registry
    }

    /// Declares a module. Declaring the same name twice replaces the root.
    pub fn declare(&mut self, definition: ModuleDefinition) {
        if let Some(existing) = self
            .declared
            .iter_mut()
            .find(|d| d.name.eq_ignore_ascii_case(&definition.name))
        {
            *existing = definition;
        } else {
            self.declared.push(definition);
        }
    }

    /// Returns the declared modules.
    pub fn declared(&self) -> &[ModuleDefinition] {
        &self.declared
    }

    /// Determines whether the leading segments of `path` name a module.
    ///
    /// Matching is greedy: the module consuming the most segments wins, so
    /// `/sales/reports/x` resolves to `Sales.Reports` over `Sales` when both
    /// exist. Segment comparison is case-insensitive.
    pub fn find(&self, path: &str) -> Option<String> {
        let segments: Vec<&str> = path_segments(path).collect();
        if segments.is_empty() {
            return None;
        }

        let declared = self
            .declared
            .iter()
            .filter_map(|d| {
                let components: Vec<&str> = d.components().collect();
                let matches = components.len() <= segments.len()
                    && components
                        .iter()
                        .zip(&segments)
                        .all(|(c, s)| c.eq_ignore_ascii_case(s));
                matches.then(|| (components.len(), d.name.clone()))
            })
            .max_by_key(|(depth, _)| *depth);

        let discovered = self.discover(&segments);

        match (declared, discovered) {
            (Some(d), Some(f)) => Some(if f.0 > d.0 { f.1 } else { d.1 }),
            (Some(d), None) => Some(d.1),
            (None, Some(f)) => Some(f.1),
            (None, None) => None,
        }
    }

    /// Walks the modules root along `segments`, returning the deepest module
    /// directory reached and its dotted name. The walk stops at the first
    /// segment that cannot name a directory below the root (`.`, `..`, hidden).
    fn discover(&self, segments: &[&str]) -> Option<(usize, String)> {
        let root = self.modules_root.as_ref()?;
        let mut current = root.clone();
        let mut names: Vec<String> = Vec::new();

        for segment in segments {
            if !is_module_component(segment)
                || RESERVED_DIRS.iter().any(|r| r.eq_ignore_ascii_case(segment)) {
                break;
            }
            let Some(dir_name) = child_module_dir(&current, segment) else {
                break;
            };
            current.push(&dir_name);
            names.push(dir_name);
        }

        (!names.is_empty()).then(|| (names.len(), names.join(".")))
    }

    /// Returns the root directory of a known module.
    ///
    /// Names with an empty, relative or hidden dotted component are never
    /// resolved against the modules root.
    pub fn module_root(&self, name: &str) -> Option<PathBuf> {
        if let Some(d) = self
            .declared
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
        {
            return Some(d.root.clone());
        }
        if !name.split('.').all(is_module_component) {
            return None;
        }
        let root = self.modules_root.as_ref()?;
        let dir = name.split('.').fold(root.clone(), |acc, c| acc.join(c));
        dir.is_dir().then_some(dir)
    }

    /// Loads a module, registering its search roots.
    ///
    /// Loading an already-loaded module is a no-op. Returns `true` if the
    /// module is loaded when the call returns.
    pub fn load(&self, name: &str) -> bool {
        let key = registry_key(name);
        if self.read_loaded().contains_key(&key) {
            return true;
        }

        let Some(root) = self.module_root(name) else {
            tracing::warn!(module = name, "module cannot be loaded: unknown module");
            return false;
        };

        let mut loaded = self
            .loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        loaded.entry(key).or_insert_with(|| {
            tracing::info!(module = name, root = %root.display(), "module loaded");
            vec![root]
        });
        true
    }

    /// Returns `true` if the module has been loaded.
    pub fn loaded(&self, name: &str) -> bool {
        self.read_loaded().contains_key(&registry_key(name))
    }

    /// Returns the search roots registered by a loaded module, in order.
    ///
    /// Unloaded modules have no search roots.
    pub fn search_paths(&self, name: &str) -> Vec<PathBuf> {
        self.read_loaded()
            .get(&registry_key(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the number of loaded modules.
    pub fn loaded_count(&self) -> usize {
        self.read_loaded().len()
    }

    fn read_loaded(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Vec<PathBuf>>> {
        self.loaded.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes the segments naming `module` from the front of `path`.
///
/// The result is relative (no leading slash) and has empty segments removed.
///
/// ```
/// use trellis_core::modules::strip_module_prefix;
///
/// assert_eq!(strip_module_prefix("/sales/reports/monthly/3", "Sales.Reports"), "monthly/3");
/// assert_eq!(strip_module_prefix("/reports", "Reports"), "");
/// ```
pub fn strip_module_prefix(path: &str, module: &str) -> String {
    let depth = module.split('.').count();
    path_segments(path)
        .skip(depth)
        .collect::<Vec<_>>()
        .join("/")
}

/// Splits a path into its non-empty segments.
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Returns `true` if `component` may name a module directory.
fn is_module_component(component: &str) -> bool {
    !component.is_empty() && !component.starts_with('.') && !component.contains(['/', '\\'])
}

fn registry_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Finds the child directory of `parent` that a URL segment refers to, trying
/// the segment verbatim and then its camelized form.
fn child_module_dir(parent: &Path, segment: &str) -> Option<String> {
    [segment.to_string(), camelize(segment)]
        .into_iter()
        .find(|candidate| is_module_component(candidate) && parent.join(candidate).is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Sales/Reports/webroot")).unwrap();
        std::fs::create_dir_all(dir.path().join("Sales/views")).unwrap();
        std::fs::create_dir_all(dir.path().join("Blog")).unwrap();
        dir
    }

    #[test]
    fn test_find_declared_module() {
        let mut registry = ModuleRegistry::new();
        registry.declare(ModuleDefinition::new("reports", "/tmp/reports"));
        assert_eq!(registry.find("/reports/monthly").as_deref(), Some("reports"));
        assert_eq!(registry.find("/REPORTS").as_deref(), Some("reports"));
        assert!(registry.find("/sales/reports").is_none());
        assert!(registry.find("/").is_none());
    }

    #[test]
    fn test_find_prefers_deepest_declared_module() {
        let mut registry = ModuleRegistry::new();
        registry.declare(ModuleDefinition::new("Sales", "/m/sales"));
        registry.declare(ModuleDefinition::new("Sales.Reports", "/m/sales/reports"));
        assert_eq!(
            registry.find("/sales/reports/q1").as_deref(),
            Some("Sales.Reports")
        );
        assert_eq!(registry.find("/sales/orders").as_deref(), Some("Sales"));
    }

    #[test]
    fn test_find_discovers_nested_directories() {
        let tree = module_tree();
        let registry = ModuleRegistry::with_modules_root(tree.path());
        assert_eq!(
            registry.find("/sales/reports/css/app.css").as_deref(),
            Some("Sales.Reports")
        );
        assert_eq!(registry.find("/blog/posts").as_deref(), Some("Blog"));
        assert!(registry.find("/shop").is_none());
    }

    #[test]
    fn test_find_skips_reserved_directories() {
        let tree = module_tree();
        let registry = ModuleRegistry::with_modules_root(tree.path());
        assert_eq!(registry.find("/sales/views/x").as_deref(), Some("Sales"));
    }

    #[test]
    fn test_load_is_idempotent() {
        let tree = module_tree();
        let registry = ModuleRegistry::with_modules_root(tree.path());

        assert!(!registry.loaded("Sales.Reports"));
        assert!(registry.load("Sales.Reports"));
        assert!(registry.load("Sales.Reports"));
        assert!(registry.loaded("Sales.Reports"));
        assert_eq!(registry.search_paths("Sales.Reports").len(), 1);
        assert_eq!(registry.loaded_count(), 1);
    }

    #[test]
    fn test_load_unknown_module_fails() {
        let registry = ModuleRegistry::new();
        assert!(!registry.load("Ghost"));
        assert!(!registry.loaded("Ghost"));
        assert!(registry.search_paths("Ghost").is_empty());
    }

    #[test]
    fn test_declare_replaces_existing_root() {
        let mut registry = ModuleRegistry::new();
        registry.declare(ModuleDefinition::new("Blog", "/old"));
        registry.declare(ModuleDefinition::new("blog", "/new"));
        assert_eq!(registry.declared().len(), 1);
        assert_eq!(registry.module_root("Blog"), Some(PathBuf::from("/new")));
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            modules: vec![crate::settings::ModuleSettings {
                name: "Crm".to_string(),
                path: PathBuf::from("/srv/crm"),
            }],
            ..Settings::default()
        };
        let registry = ModuleRegistry::from_settings(&settings);
        assert_eq!(registry.find("/crm").as_deref(), Some("Crm"));
    }

    #[test]
    fn test_strip_module_prefix() {
        assert_eq!(strip_module_prefix("/blog/posts/view/", "Blog"), "posts/view");
        assert_eq!(strip_module_prefix("blog", "Blog"), "");
    }

    #[test]
    fn test_find_rejects_relative_segments() {
        let tree = module_tree();
        std::fs::create_dir_all(tree.path().join(".git")).unwrap();
        let registry = ModuleRegistry::with_modules_root(tree.path().join("Blog"));

        assert!(registry.find("/../x").is_none());
        assert!(registry.find("/../../../../a/b").is_none());
        assert!(registry.find("/./x").is_none());

        let registry = ModuleRegistry::with_modules_root(tree.path());
        assert!(registry.find("/.git/config").is_none());
        assert_eq!(registry.find("/blog/../x").as_deref(), Some("Blog"));
    }

    #[test]
    fn test_load_rejects_relative_names() {
        let tree = module_tree();
        let registry = ModuleRegistry::with_modules_root(tree.path().join("Blog"));

        for name in ["..", ".", "...", "Sales..Reports", ".Sales", ""] {
            assert!(!registry.load(name), "{name:?} should not load");
            assert!(registry.module_root(name).is_none());
        }
        assert_eq!(registry.loaded_count(), 0);
    }

    #[test]
    fn test_concurrent_load_registers_once() {
        let tree = module_tree();
        let registry = std::sync::Arc::new(ModuleRegistry::with_modules_root(tree.path()));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let registry = registry.clone();
                scope.spawn(move || assert!(registry.load("Sales.Reports")));
            }
        });

        assert!(registry.loaded("sales.reports"));
        assert_eq!(registry.search_paths("Sales.Reports").len(), 1);
        assert_eq!(registry.loaded_count(), 1);
    }
}
