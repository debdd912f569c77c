//! The route table and path parser.
//!
//! [`Router::parse`] tries, in order, and stops at the first hit:
//!
//! 1. an exact literal route,
//! 2. the application-level static page convention,
//! 3. the module-scoped static page convention,
//! 4. token and wildcard routes in descending pattern order,
//! 5. the positional `/<controller>/<action>/<pass...>` convention.
//!
//! Explicit routes therefore always override conventions, and the descending
//! key order makes a longer literal prefix win over a shorter one it extends.

use std::collections::BTreeMap;
use std::sync::Arc;

use trellis_core::modules::{path_segments, strip_module_prefix, ModuleRegistry};
use trellis_core::{TrellisError, TrellisResult};

use super::normalize::{normalize_path, positional_params, DISPLAY_ACTION, MODULE_CONTROLLER};
use super::params::{ParsedParams, DEFAULT_ACTION};
use super::spec::{Route, RouteSpec, RouteTarget};
use super::static_pages::{probe_module_page, probe_page, ViewLocator, PAGES_CONTROLLER};

/// The route table plus the collaborators needed to parse paths.
///
/// Routes are registered with [`connect`](Router::connect) while the router is
/// still owned by bootstrap code. Once shared behind an `Arc` the table can no
/// longer change.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use trellis_core::ModuleRegistry;
/// use trellis_http::routing::{Router, RouteTarget};
///
/// let mut router = Router::new(Arc::new(ModuleRegistry::new()));
/// router.connect("/", RouteTarget::controller("pages").action("display").with("page", "home")).unwrap();
/// router.connect("/admin/:controller", RouteTarget::default().module("Admin")).unwrap();
///
/// let params = router.parse("/admin/users/edit/4");
/// assert_eq!(params.module.as_deref(), Some("Admin"));
/// assert_eq!(params.controller, "users");
/// assert_eq!(params.action, "edit");
/// assert_eq!(params.pass, vec!["4".to_string()]);
/// ```
pub struct Router {
    routes: BTreeMap<String, Route>,
    modules: Arc<ModuleRegistry>,
    views: Option<Arc<dyn ViewLocator>>,
    auto_static_pages: bool,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.keys().rev().collect::<Vec<_>>())
            .field("has_views", &self.views.is_some())
            .field("auto_static_pages", &self.auto_static_pages)
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Creates an empty router using `modules` for module detection.
    pub fn new(modules: Arc<ModuleRegistry>) -> Self {
        Self {
            routes: BTreeMap::new(),
            modules,
            views: None,
            auto_static_pages: true,
        }
    }

    /// Attaches the view locator used by the static page convention.
    #[must_use]
    pub fn with_view_locator(mut self, views: Arc<dyn ViewLocator>) -> Self {
        self.views = Some(views);
        self
    }

    /// Enables or disables the static page convention.
    #[must_use]
    pub const fn auto_static_pages(mut self, enabled: bool) -> Self {
        self.auto_static_pages = enabled;
        self
    }

    /// Returns the module registry used for detection.
    pub const fn modules(&self) -> &Arc<ModuleRegistry> {
        &self.modules
    }

    /// Registers a route. Registering an existing pattern replaces its target.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::ImproperlyConfigured`] when the target names no
    /// controller and the pattern does not provide one via `:controller`.
    pub fn connect(&mut self, pattern: &str, target: RouteTarget) -> TrellisResult<()> {
        let route = Route::new(pattern, target);

        let needs_controller = !matches!(route.spec(), RouteSpec::ControllerToken { .. });
        let has_controller = route
            .target()
            .controller
            .as_deref()
            .is_some_and(|c| !c.is_empty());
        if needs_controller && !has_controller {
            return Err(TrellisError::ImproperlyConfigured(format!(
                "route '{}' must name a controller",
                route.pattern()
            )));
        }

        tracing::debug!(pattern = route.pattern(), spec = ?route.spec(), "route connected");
        self.routes.insert(route.pattern().to_string(), route);
        Ok(())
    }

    /// Iterates routes in evaluation order (descending pattern).
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values().rev()
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Parses a path into routing parameters. Never fails.
    pub fn parse(&self, path: &str) -> ParsedParams {
        let path = normalize_path(path);

        if let Some(route) = self.routes.get(&path).filter(|r| r.spec().is_literal()) {
            tracing::debug!(path = %path, "literal route matched");
            return route.target().normalize();
        }

        let views = self.views.as_deref().filter(|_| self.auto_static_pages);

        if let Some(params) = views.and_then(|v| probe_page(v, &path)) {
            return params;
        }

        let module = self.modules.find(&path);

        if let (Some(views), Some(module)) = (views, module.as_deref()) {
            let relative = strip_module_prefix(&path, module);
            if let Some(params) = probe_module_page(views, &relative, module) {
                return params;
            }
        }

        for route in self.routes() {
            if let Some(params) = route.match_path(&path) {
                tracing::debug!(path = %path, pattern = route.pattern(), "token route matched");
                return params;
            }
        }

        let params = positional_params(&path, module.as_deref());
        tracing::debug!(path = %path, params = %params, "positional convention applied");
        params
    }

    /// Builds a URL for routing parameters.
    ///
    /// A literal route whose target normalizes to `params` wins; otherwise the
    /// positional convention is reversed. `index` actions without passed
    /// arguments are omitted.
    pub fn url(&self, params: &ParsedParams) -> String {
        if let Some(route) = self
            .routes()
            .find(|r| r.spec().is_literal() && r.target().normalize() == *params)
        {
            return route.pattern().to_string();
        }

        let mut segments: Vec<String> = params
            .module
            .iter()
            .flat_map(|m| m.split('.'))
            .map(str::to_lowercase)
            .collect();

        let is_display = params.action == DISPLAY_ACTION;
        if params.controller == MODULE_CONTROLLER && is_display && params.module.is_some() {
            // module landing page: the module path alone
        } else if params.controller == PAGES_CONTROLLER && is_display {
            segments.extend(
                params
                    .pass
                    .iter()
                    .flat_map(|p| path_segments(p))
                    .map(String::from),
            );
        } else {
            if !params.controller.is_empty() {
                segments.push(params.controller.clone());
            }
            if params.action != DEFAULT_ACTION || !params.pass.is_empty() {
                segments.push(params.action.clone());
            }
            segments.extend(params.pass.iter().cloned());
        }

        format!("/{}", segments.join("/"))
    }
}
