//! Settings system for the trellis framework.
//!
//! This module provides the [`Settings`] struct, which holds all framework configuration.
//! There is no global instance: the application builds its registries from a
//! `Settings` value and passes them down explicitly.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A module declared up front in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSettings {
    /// Dotted module name, e.g. `Sales.Reports`.
    pub name: String,
    /// Root directory of the module (contains `webroot/`, `views/`).
    pub path: PathBuf,
}

/// The complete set of framework settings.
///
/// # Examples
///
/// ```
/// use trellis_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert!(settings.auto_static_pages);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,
    /// The application root. `<app_root>/webroot` is the primary webroot,
    /// served by the front-end server rather than by the dispatcher.
    pub app_root: PathBuf,
    /// URL prefix the application is mounted under (e.g. `/app`).
    pub base_url: String,

    // ── Search paths ─────────────────────────────────────────────────

    /// Ordered filesystem roots searched for `webroot/` assets and `views/`.
    /// Earlier entries win, so list application overrides before core defaults.
    pub search_paths: Vec<PathBuf>,

    // ── Modules ──────────────────────────────────────────────────────

    /// Directory holding discoverable modules (`A.B` lives in `<root>/A/B`).
    pub modules_root: Option<PathBuf>,
    /// Explicitly declared modules.
    pub modules: Vec<ModuleSettings>,

    // ── Routing ──────────────────────────────────────────────────────

    /// Whether paths are probed against `pages/` views before token routes.
    pub auto_static_pages: bool,

    // ── Assets ───────────────────────────────────────────────────────

    /// `Cache-Control: max-age` sent with assets served by the dispatcher.
    pub asset_cache_max_age: u64,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            app_root: PathBuf::from("."),
            base_url: String::new(),

            search_paths: vec![PathBuf::from(".")],

            modules_root: None,
            modules: Vec::new(),

            auto_static_pages: true,

            asset_cache_max_age: 3600,

            log_level: "info".to_string(),

            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Returns the primary application webroot.
    pub fn app_webroot(&self) -> PathBuf {
        self.app_root.join("webroot")
    }
}
