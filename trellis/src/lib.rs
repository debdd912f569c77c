//! # trellis
//!
//! URL routing and request dispatch for module-structured web applications.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `trellis` to get the entire framework, or depend on
//! individual crates for finer-grained control.
//!
//! ```no_run
//! use trellis::prelude::*;
//!
//! # async fn example() -> TrellisResult<()> {
//! let settings = trellis::core::settings_loader::from_env();
//! let app = TrellisApp::from_settings(settings, ControllerRegistry::with_builtins(), |router| {
//!     router.connect("/", RouteTarget::controller("pages").action("display").with("page", "home"))?;
//!     router.connect("/admin/:controller", RouteTarget::default().module("Admin"))
//! })?;
//! app.run("127.0.0.1:8000").await
//! # }
//! ```

/// Settings, errors, logging and the module registry.
pub use trellis_core as core;

/// Request, response, routing and static assets.
pub use trellis_http as http;

/// Controllers, dispatcher and the axum server.
#[cfg(feature = "server")]
pub use trellis_dispatch as dispatch;

// Re-export third-party crates used in public signatures.
pub use axum;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
pub use tracing_subscriber;

/// The types most applications need.
pub mod prelude {
    pub use trellis_core::{ModuleDefinition, ModuleRegistry, Settings, TrellisError, TrellisResult};
    pub use trellis_http::routing::{ParsedParams, RouteTarget, Router};
    pub use trellis_http::{HttpRequest, HttpResponse};

    #[cfg(feature = "server")]
    pub use trellis_dispatch::{
        ActionOutput, ActionTable, Arity, Controller, ControllerContext, ControllerRegistry,
        DispatchOutcome, Dispatcher, TrellisApp,
    };
}
