//! Core error types for the trellis framework.
//!
//! This module provides [`TrellisError`], the single error enum shared by the
//! router, the asset resolver and the dispatcher. Routing failures are fatal
//! for the request that raised them; they propagate to the caller untouched and
//! are turned into an HTTP response only by the outer server layer via
//! [`TrellisError::status_code`].

use thiserror::Error;

/// The primary error type for the trellis framework.
///
/// Each variant maps to an HTTP status code via [`TrellisError::status_code`].
#[derive(Error, Debug)]
pub enum TrellisError {
    // ── Routing ──────────────────────────────────────────────────────

    /// A parsed module name could not be loaded.
    #[error("Module missing: {0}")]
    ModuleMissing(String),

    /// No controller is registered under the resolved name.
    #[error("Controller missing: {controller} (module: {})", module.as_deref().unwrap_or("-"))]
    ControllerMissing {
        /// The module the controller was looked up in, if any.
        module: Option<String>,
        /// The controller class name that was looked up.
        controller: String,
    },

    /// The controller exists but exposes no action with the requested name.
    #[error("Action missing: {controller}::{action}")]
    ActionMissing {
        /// The controller class name.
        controller: String,
        /// The requested action.
        action: String,
    },

    /// The passed arguments do not fit the action's declared arity.
    #[error("Argument mismatch for {action}: expected {expected}, got {given}")]
    ArgumentMismatch {
        /// The requested action.
        action: String,
        /// Human readable arity, e.g. `"1..=2"`.
        expected: String,
        /// The number of passed arguments.
        given: usize,
    },

    // ── HTTP ─────────────────────────────────────────────────────────

    /// HTTP 400 Bad Request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 404 Not Found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP 500 Internal Server Error.
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The framework is improperly configured.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── Views ────────────────────────────────────────────────────────

    /// A view template could not be located or rendered.
    #[error("Template error: {0}")]
    TemplateError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TrellisError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `ModuleMissing`, `ControllerMissing`, `ActionMissing`,
    ///   `ArgumentMismatch`, `NotFound` -> 404
    /// - `BadRequest` -> 400
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ModuleMissing(_)
            | Self::ControllerMissing { .. }
            | Self::ActionMissing { .. }
            | Self::ArgumentMismatch { .. }
            | Self::NotFound(_) => 404,
            Self::BadRequest(_) => 400,
            Self::InternalServerError(_)
            | Self::ConfigurationError(_)
            | Self::ImproperlyConfigured(_)
            | Self::TemplateError(_)
            | Self::IoError(_) => 500,
        }
    }

    /// Returns `true` for the errors raised while resolving a route to a
    /// controller action.
    pub const fn is_routing_error(&self) -> bool {
        matches!(
            self,
            Self::ModuleMissing(_)
                | Self::ControllerMissing { .. }
                | Self::ActionMissing { .. }
                | Self::ArgumentMismatch { .. }
        )
    }
}

/// A convenience type alias for `Result<T, TrellisError>`.
pub type TrellisResult<T> = Result<T, TrellisError>;
