//! Static asset resolution.
//!
//! Runs before routing. Each search root contributes a `webroot/` directory;
//! the first root holding the requested file wins. Paths inside a module are
//! looked up only in that module's roots, relative to the module.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use http::header::CACHE_CONTROL;
use http::HeaderValue;
use trellis_core::modules::{path_segments, strip_module_prefix, ModuleRegistry};
use trellis_core::{Settings, TrellisResult};

use crate::response::HttpResponse;

/// Name of the public directory inside every search root.
pub const WEBROOT_DIR: &str = "webroot";

/// A located static file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Absolute location of the file.
    pub path: PathBuf,
    /// `true` when the file lives in the primary application webroot, which
    /// the front-end server serves on its own.
    pub delegated: bool,
}

/// Finds and serves static files under the configured webroots.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use trellis_core::ModuleRegistry;
/// use trellis_http::assets::AssetResolver;
///
/// let resolver = AssetResolver::new(
///     vec!["/srv/app".into()],
///     "/srv/app/webroot",
///     Arc::new(ModuleRegistry::new()),
/// );
/// assert!(resolver.locate("/").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct AssetResolver {
    search_paths: Vec<PathBuf>,
    app_webroot: PathBuf,
    modules: Arc<ModuleRegistry>,
    cache_max_age: u64,
}

impl AssetResolver {
    /// Creates a resolver over `search_paths`, searched in order.
    pub fn new(
        search_paths: Vec<PathBuf>,
        app_webroot: impl Into<PathBuf>,
        modules: Arc<ModuleRegistry>,
    ) -> Self {
        Self {
            search_paths,
            app_webroot: app_webroot.into(),
            modules,
            cache_max_age: 3600,
        }
    }

    /// Builds a resolver from the search paths and cache policy in `settings`.
    pub fn from_settings(settings: &Settings, modules: Arc<ModuleRegistry>) -> Self {
        Self::new(settings.search_paths.clone(), settings.app_webroot(), modules)
            .with_cache_max_age(settings.asset_cache_max_age)
    }

    /// Sets the `max-age` sent with served files.
    #[must_use]
    pub const fn with_cache_max_age(mut self, seconds: u64) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Returns the application search roots.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Locates the file `path` refers to, if any.
    pub fn locate(&self, path: &str) -> Option<Asset> {
        let segments: Vec<&str> = path_segments(path).collect();
        if segments.is_empty() || segments.iter().any(|s| *s == "..") {
            return None;
        }

        if path.trim_start_matches('/').contains('/') {
            if let Some(module) = self.modules.find(path).filter(|m| self.modules.load(m)) {
                let relative = strip_module_prefix(path, &module);
                if relative.is_empty() {
                    return None;
                }
                tracing::debug!(path, module = %module, "asset lookup scoped to module");
                return self.search(&self.modules.search_paths(&module), &relative);
            }
        }

        self.search(&self.search_paths, &segments.join("/"))
    }

    fn search(&self, roots: &[PathBuf], relative: &str) -> Option<Asset> {
        roots.iter().find_map(|root| {
            let webroot = root.join(WEBROOT_DIR);
            let candidate = webroot.join(relative);
            candidate.is_file().then(|| Asset {
                delegated: same_dir(&webroot, &self.app_webroot),
                path: candidate,
            })
        })
    }

    /// Serves `path` into `response` if it names a static file.
    ///
    /// Returns `Ok(true)` when the request is fully handled and routing must
    /// not run. Files in the primary application webroot are left to the
    /// front-end server and produce no body.
    pub fn try_serve(&self, path: &str, response: &mut HttpResponse) -> TrellisResult<bool> {
        let Some(asset) = self.locate(path) else {
            return Ok(false);
        };

        if asset.delegated {
            tracing::debug!(path, "asset delegated to front-end server");
            return Ok(true);
        }

        response.send_file(&asset.path)?;
        let cache = format!("public, max-age={}", self.cache_max_age);
        if let Ok(value) = HeaderValue::from_str(&cache) {
            response.set_header(CACHE_CONTROL, value);
        }
        tracing::debug!(path, file = %asset.path.display(), "asset served");
        Ok(true)
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use trellis_core::ModuleDefinition;

    struct Fixture {
        _dir: tempfile::TempDir,
        app: PathBuf,
        core: PathBuf,
        module: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        let core = dir.path().join("core");
        let module = dir.path().join("modules/Shop");
        fs::create_dir_all(app.join("webroot/css")).unwrap();
        fs::create_dir_all(core.join("webroot/js")).unwrap();
        fs::create_dir_all(core.join("webroot/css")).unwrap();
        fs::create_dir_all(module.join("webroot/img")).unwrap();
        fs::write(app.join("webroot/css/site.css"), "body{}").unwrap();
        fs::write(core.join("webroot/js/app.js"), "let a;").unwrap();
        fs::write(core.join("webroot/css/site.css"), "core").unwrap();
        fs::write(module.join("webroot/img/logo.png"), [0x89, 0x50]).unwrap();
        Fixture {
            _dir: dir,
            app,
            core,
            module,
        }
    }

    fn resolver(f: &Fixture) -> AssetResolver {
        let mut modules = ModuleRegistry::new();
        modules.declare(ModuleDefinition::new("Shop", &f.module));
        AssetResolver::new(
            vec![f.app.clone(), f.core.clone()],
            f.app.join("webroot"),
            Arc::new(modules),
        )
    }

    #[test]
    fn test_empty_and_root_are_not_assets() {
        let f = fixture();
        let r = resolver(&f);
        assert!(r.locate("").is_none());
        assert!(r.locate("/").is_none());
    }

    #[test]
    fn test_parent_segments_rejected() {
        let f = fixture();
        let r = resolver(&f);
        assert!(r.locate("/css/../css/site.css").is_none());
    }

    #[test]
    fn test_app_webroot_is_delegated() {
        let f = fixture();
        let r = resolver(&f);
        let asset = r.locate("/css/site.css").unwrap();
        assert!(asset.delegated);
        assert_eq!(asset.path, f.app.join("webroot/css/site.css"));

        let mut response = HttpResponse::new();
        assert!(r.try_serve("/css/site.css", &mut response).unwrap());
        assert!(!response.has_body());
    }

    #[test]
    fn test_secondary_root_is_served() {
        let f = fixture();
        let r = resolver(&f).with_cache_max_age(60);
        let mut response = HttpResponse::new();
        assert!(r.try_serve("/js/app.js", &mut response).unwrap());
        assert_eq!(response.body().as_bytes(), b"let a;");
        assert_eq!(response.headers()[CACHE_CONTROL], "public, max-age=60");
    }

    #[test]
    fn test_module_asset_is_relative_to_module() {
        let f = fixture();
        let r = resolver(&f);
        let asset = r.locate("/shop/img/logo.png").unwrap();
        assert!(!asset.delegated);
        assert_eq!(asset.path, f.module.join("webroot/img/logo.png"));
    }

    #[test]
    fn test_module_lookup_is_exclusive() {
        let f = fixture();
        fs::create_dir_all(f.app.join("webroot/shop")).unwrap();
        fs::write(f.app.join("webroot/shop/only-in-app.txt"), "x").unwrap();
        let r = resolver(&f);
        assert!(r.locate("/shop/only-in-app.txt").is_none());
    }

    #[test]
    fn test_miss_leaves_response_untouched() {
        let f = fixture();
        let r = resolver(&f);
        let mut response = HttpResponse::new();
        assert!(!r.try_serve("/users/view/1", &mut response).unwrap());
        assert!(!response.has_body());
    }
}
