//! Static page convention.
//!
//! A path with no explicit route is served by the generic `pages` controller
//! when a view named `pages/<path>` exists. View lookup belongs to the view
//! layer, so the router only sees it through [`ViewLocator`].

use super::normalize::{clean_path, DISPLAY_ACTION};
use super::params::ParsedParams;

/// Controller serving static pages.
pub const PAGES_CONTROLLER: &str = "pages";

/// View namespace probed for static pages.
pub const PAGES_VIEW_DIR: &str = "pages";

/// Answers whether a logical view exists.
pub trait ViewLocator: Send + Sync {
    /// Returns `true` if `logical_path` (e.g. `pages/about`) resolves to a view,
    /// scoped to `module` when given.
    fn location_exists(&self, logical_path: &str, module: Option<&str>) -> bool;
}

/// Returns the logical view path a static page lives at.
pub fn page_view_path(cleaned: &str) -> String {
    format!("{PAGES_VIEW_DIR}/{cleaned}")
}

/// Probes the application-level page for `path`.
///
/// On a hit the original path is passed to the `display` action.
pub fn probe_page(views: &dyn ViewLocator, path: &str) -> Option<ParsedParams> {
    let cleaned = clean_path(path);
    if cleaned.is_empty() || !views.location_exists(&page_view_path(cleaned), None) {
        return None;
    }
    tracing::debug!(path, "static page matched");
    Some(ParsedParams::new(
        None,
        PAGES_CONTROLLER,
        DISPLAY_ACTION,
        vec![path.to_string()],
    ))
}

/// Probes the module-scoped page for an already module-relative path.
pub fn probe_module_page(
    views: &dyn ViewLocator,
    relative: &str,
    module: &str,
) -> Option<ParsedParams> {
    let cleaned = clean_path(relative);
    if cleaned.is_empty() || !views.location_exists(&page_view_path(cleaned), Some(module)) {
        return None;
    }
    tracing::debug!(module, page = cleaned, "module static page matched");
    Some(ParsedParams::new(
        Some(module.to_string()),
        PAGES_CONTROLLER,
        DISPLAY_ACTION,
        vec![cleaned.to_string()],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static [(&'static str, Option<&'static str>)]);

    impl ViewLocator for Fixed {
        fn location_exists(&self, logical_path: &str, module: Option<&str>) -> bool {
            self.0.iter().any(|(p, m)| *p == logical_path && *m == module)
        }
    }

    #[test]
    fn test_probe_page_hit() {
        let views = Fixed(&[("pages/about/team", None)]);
        let params = probe_page(&views, "/about/team/").unwrap();
        assert_eq!(params.controller, "pages");
        assert_eq!(params.action, "display");
        assert_eq!(params.pass, vec!["/about/team/".to_string()]);
    }

    #[test]
    fn test_probe_page_skips_root() {
        let views = Fixed(&[("pages/", None)]);
        assert!(probe_page(&views, "/").is_none());
    }

    #[test]
    fn test_probe_module_page_is_scoped() {
        let views = Fixed(&[("pages/faq", Some("Help"))]);
        let params = probe_module_page(&views, "faq", "Help").unwrap();
        assert_eq!(params.module.as_deref(), Some("Help"));
        assert_eq!(params.pass, vec!["faq".to_string()]);
        assert!(probe_page(&views, "/faq").is_none());
    }
}
