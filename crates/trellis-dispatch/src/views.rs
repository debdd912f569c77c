//! View location and rendering.
//!
//! Views are plain files at `<root>/views/<logical path>.html`, where the roots
//! are the application search paths or, for module-scoped lookups, the roots
//! registered by the module when it was loaded. Rendering substitutes the
//! controller's view variables with [`tera`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use trellis_core::modules::{path_segments, ModuleRegistry};
use trellis_core::{Settings, TrellisError, TrellisResult};
use trellis_http::routing::ViewLocator;

/// Directory holding views inside every search root.
pub const VIEWS_DIR: &str = "views";

/// File extension of view files.
pub const VIEW_EXTENSION: &str = "html";

/// Renders a logical view with a set of variables.
pub trait ViewRenderer: ViewLocator {
    /// Renders `logical_path`, scoped to `module` when given.
    fn render(
        &self,
        logical_path: &str,
        module: Option<&str>,
        vars: &HashMap<String, serde_json::Value>,
    ) -> TrellisResult<String>;
}

/// Filesystem-backed views.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use trellis_core::ModuleRegistry;
/// use trellis_dispatch::views::FileViews;
/// use trellis_http::routing::ViewLocator;
///
/// let views = FileViews::new(vec!["/nonexistent".into()], Arc::new(ModuleRegistry::new()));
/// assert!(!views.location_exists("pages/about", None));
/// ```
#[derive(Debug, Clone)]
pub struct FileViews {
    search_paths: Vec<PathBuf>,
    modules: Arc<ModuleRegistry>,
}

impl FileViews {
    /// Creates views over the application `search_paths`.
    pub const fn new(search_paths: Vec<PathBuf>, modules: Arc<ModuleRegistry>) -> Self {
        Self {
            search_paths,
            modules,
        }
    }

    /// Creates views over the search paths in `settings`.
    pub fn from_settings(settings: &Settings, modules: Arc<ModuleRegistry>) -> Self {
        Self::new(settings.search_paths.clone(), modules)
    }

    /// Returns the file a logical view resolves to.
    ///
    /// Module-scoped lookups load the module first and search only its roots.
    pub fn resolve(&self, logical_path: &str, module: Option<&str>) -> Option<PathBuf> {
        let segments: Vec<&str> = path_segments(logical_path).collect();
        if segments.is_empty() || segments.iter().any(|s| *s == "..") {
            return None;
        }
        let relative = format!("{}.{VIEW_EXTENSION}", segments.join("/"));

        let module_roots;
        let roots = match module {
            Some(module) => {
                if !self.modules.load(module) {
                    return None;
                }
                module_roots = self.modules.search_paths(module);
                &module_roots
            }
            None => &self.search_paths,
        };

        roots
            .iter()
            .map(|root| root.join(VIEWS_DIR).join(&relative))
            .find(|candidate| candidate.is_file())
    }
}

impl ViewLocator for FileViews {
    fn location_exists(&self, logical_path: &str, module: Option<&str>) -> bool {
        self.resolve(logical_path, module).is_some()
    }
}

impl ViewRenderer for FileViews {
    fn render(
        &self,
        logical_path: &str,
        module: Option<&str>,
        vars: &HashMap<String, serde_json::Value>,
    ) -> TrellisResult<String> {
        let Some(file) = self.resolve(logical_path, module) else {
            return Err(TrellisError::TemplateError(format!(
                "view '{logical_path}' not found (module: {})",
                module.unwrap_or("-")
            )));
        };

        let source = std::fs::read_to_string(&file)?;
        let mut context = tera::Context::new();
        for (key, value) in vars {
            context.insert(key.as_str(), value);
        }

        tracing::debug!(view = logical_path, file = %file.display(), "rendering view");
        tera::Tera::one_off(&source, &context, true)
            .map_err(|e| TrellisError::TemplateError(format!("{logical_path}: {e}")))
    }
}
