//! Settings loading from configuration files.
//!
//! This module provides functions to load [`Settings`] from TOML files, JSON
//! files, and to apply environment variable overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `TRELLIS_DEBUG` | `debug` |
//! | `TRELLIS_LOG_LEVEL` | `log_level` |
//! | `TRELLIS_APP_ROOT` | `app_root` |
//! | `TRELLIS_BASE_URL` | `base_url` |
//! | `TRELLIS_MODULES_ROOT` | `modules_root` |
//! | `TRELLIS_AUTO_STATIC_PAGES` | `auto_static_pages` |
//! | `TRELLIS_SEARCH_PATHS` | `search_paths` (platform path-list separator) |
//! | `TRELLIS_ASSET_CACHE_MAX_AGE` | `asset_cache_max_age` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use trellis_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/trellis.toml").unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::TrellisError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Any fields not present in the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, TrellisError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| TrellisError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, TrellisError> {
    from_toml_str(&read_config(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, TrellisError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<Settings, TrellisError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| TrellisError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, TrellisError> {
    from_json_str(&read_config(path.as_ref(), "JSON")?)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `TRELLIS_*` environment variable overrides to a settings struct.
///
/// Boolean variables accept `"true"`, `"1"` and `"yes"` as true; anything else
/// is false. Unparseable numbers leave the setting unchanged.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("TRELLIS_DEBUG") {
        settings.debug = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("TRELLIS_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("TRELLIS_APP_ROOT") {
        settings.app_root = PathBuf::from(val);
    }

    if let Ok(val) = std::env::var("TRELLIS_BASE_URL") {
        settings.base_url = val;
    }

    if let Ok(val) = std::env::var("TRELLIS_MODULES_ROOT") {
        settings.modules_root = if val.is_empty() {
            None
        } else {
            Some(PathBuf::from(val))
        };
    }

    if let Ok(val) = std::env::var("TRELLIS_AUTO_STATIC_PAGES") {
        settings.auto_static_pages = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("TRELLIS_SEARCH_PATHS") {
        let paths: Vec<PathBuf> = std::env::split_paths(&val)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        if !paths.is_empty() {
            settings.search_paths = paths;
        }
    }

    if let Ok(val) = std::env::var("TRELLIS_ASSET_CACHE_MAX_AGE") {
        if let Ok(age) = val.parse::<u64>() {
            settings.asset_cache_max_age = age;
        }
    }
}

// ============================================================
// Helpers
// ============================================================

fn parse_flag(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn read_config(path: &Path, format: &str) -> Result<String, TrellisError> {
    std::fs::read_to_string(path).map_err(|e| {
        TrellisError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

/// Deserializes `value` on top of the default settings.
fn merge_over_defaults(value: serde_json::Value, format: &str) -> Result<Settings, TrellisError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        TrellisError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        TrellisError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            base_url = "/app"
            auto_static_pages = false
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.base_url, "/app");
        assert!(!settings.auto_static_pages);
        // Defaults preserved
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_from_toml_str_modules() {
        let toml = r#"
            modules_root = "/srv/app/modules"

            [[modules]]
            name = "Sales.Reports"
            path = "/srv/shared/reports"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.modules_root, Some(PathBuf::from("/srv/app/modules")));
        assert_eq!(settings.modules.len(), 1);
        assert_eq!(settings.modules[0].name, "Sales.Reports");
    }

    #[test]
    fn test_from_toml_str_search_paths_keep_order() {
        let toml = r#"
            search_paths = ["/srv/app", "/usr/share/trellis/core"]
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(
            settings.search_paths,
            vec![
                PathBuf::from("/srv/app"),
                PathBuf::from("/usr/share/trellis/core")
            ]
        );
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert!(settings.auto_static_pages);
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("[[invalid toml content");
        assert!(result.is_err());
    }

    // ── JSON loading ────────────────────────────────────────────────

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{
            "debug": false,
            "log_level": "debug",
            "asset_cache_max_age": 60
        }"#;

        let settings = from_json_str(json).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.asset_cache_max_age, 60);
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{invalid json").is_err());
    }

    // ── File loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trellis.toml");
        std::fs::write(&path, "log_level = \"warn\"\n").unwrap();

        let settings = from_toml_file(&path).unwrap();
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trellis.json");
        std::fs::write(&path, r#"{"base_url": "/portal"}"#).unwrap();

        let settings = from_json_file(&path).unwrap();
        assert_eq!(settings.base_url, "/portal");
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = from_toml_file("/nonexistent/path/trellis.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read TOML file"));
    }

    // ── Environment variable overrides ──────────────────────────────
    //
    // Each test owns distinct variables so they can run in parallel.

    #[test]
    fn test_apply_env_overrides_log_level() {
        let mut settings = Settings::default();
        std::env::set_var("TRELLIS_LOG_LEVEL", "debug");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.log_level, "debug");
        std::env::remove_var("TRELLIS_LOG_LEVEL");
    }

    #[test]
    fn test_apply_env_overrides_static_pages_flag() {
        let mut settings = Settings::default();
        std::env::set_var("TRELLIS_AUTO_STATIC_PAGES", "no");
        apply_env_overrides(&mut settings);
        assert!(!settings.auto_static_pages);
        std::env::remove_var("TRELLIS_AUTO_STATIC_PAGES");
    }

    #[test]
    fn test_apply_env_overrides_invalid_max_age() {
        let mut settings = Settings::default();
        std::env::set_var("TRELLIS_ASSET_CACHE_MAX_AGE", "soon");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.asset_cache_max_age, 3600);
        std::env::remove_var("TRELLIS_ASSET_CACHE_MAX_AGE");
    }

    #[test]
    fn test_toml_with_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trellis.toml");
        std::fs::write(&path, "base_url = \"/from-file\"\n").unwrap();

        std::env::set_var("TRELLIS_BASE_URL", "/from-env");
        std::env::set_var("TRELLIS_MODULES_ROOT", "/srv/modules");

        let settings = from_toml_file_with_env(&path).unwrap();
        assert_eq!(settings.base_url, "/from-env");
        assert_eq!(settings.modules_root, Some(PathBuf::from("/srv/modules")));

        std::env::remove_var("TRELLIS_BASE_URL");
        std::env::remove_var("TRELLIS_MODULES_ROOT");
    }

    // ── merge_json helper ───────────────────────────────────────────

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"outer": {"a": 1, "b": 2}});
        let over = serde_json::json!({"outer": {"b": 3}});
        let merged = merge_json(base, over);
        assert_eq!(merged["outer"]["a"], 1);
        assert_eq!(merged["outer"]["b"], 3);
    }

    #[test]
    fn test_merge_json_array_override() {
        let base = serde_json::json!({"list": [1, 2, 3]});
        let over = serde_json::json!({"list": [4, 5]});
        let merged = merge_json(base, over);
        assert_eq!(merged["list"], serde_json::json!([4, 5]));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("off"));
    }
}
