//! Path normalization helpers shared by the matcher branches.

use trellis_core::modules::strip_module_prefix;

use super::params::{ParsedParams, DEFAULT_ACTION};

pub use trellis_core::modules::path_segments;

/// Controller used for module landing pages.
pub const MODULE_CONTROLLER: &str = "module";
/// Action used by the `pages` and `module` controllers.
pub const DISPLAY_ACTION: &str = "display";

/// Ensures `path` starts with exactly one `/`.
pub fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

/// Removes leading and trailing slashes.
pub fn clean_path(path: &str) -> &str {
    path.trim_matches('/')
}

/// Strips a route prefix from `path`.
///
/// A prefix ending in `/` also accepts the path equal to the prefix without
/// its trailing slash, so `/account/:action` matches `/account`.
pub fn strip_route_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if let Some(rest) = path.strip_prefix(prefix) {
        return Some(rest);
    }
    match prefix.strip_suffix('/') {
        Some(bare) if !bare.is_empty() && path == bare => Some(""),
        _ => None,
    }
}

/// Applies the positional convention: `/<controller>/<action>/<pass...>`,
/// relative to the module when one was detected.
///
/// An empty controller under a module becomes the module landing page
/// (`module` / `display`).
pub fn positional_params(path: &str, module: Option<&str>) -> ParsedParams {
    let relative = module.map_or_else(
        || clean_path(path).to_string(),
        |m| strip_module_prefix(path, m),
    );

    let mut segments = path_segments(&relative);
    let controller = segments.next().unwrap_or_default().to_string();
    let action = segments.next().unwrap_or(DEFAULT_ACTION).to_string();
    let pass: Vec<String> = segments.map(String::from).collect();

    if controller.is_empty() && module.is_some() {
        return ParsedParams {
            module: module.map(String::from),
            controller: MODULE_CONTROLLER.to_string(),
            action: DISPLAY_ACTION.to_string(),
            pass,
        };
    }

    ParsedParams {
        module: module.map(String::from),
        controller,
        action,
        pass,
    }
}
