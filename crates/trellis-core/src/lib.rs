//! # trellis-core
//!
//! Core types, settings, module registry, and error types for the trellis framework.
//! This crate has zero framework dependencies and provides the foundation for all other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Framework settings and global configuration
//! - [`settings_loader`] - TOML/JSON loading and environment overrides
//! - [`modules`] - Module registry (discovery, lazy idempotent loading)
//! - [`logging`] - Tracing-based logging integration
//! - [`utils`] - Naming convention helpers

pub mod error;
pub mod logging;
pub mod modules;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{TrellisError, TrellisResult};
pub use modules::{ModuleDefinition, ModuleRegistry};
pub use settings::Settings;
