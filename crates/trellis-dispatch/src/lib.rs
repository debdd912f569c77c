//! # trellis-dispatch
//!
//! Request dispatch for the trellis framework: controllers and their action
//! tables, the controller registry, view collaborators, the dispatch pipeline
//! and the axum server integration.
//!
//! ## Modules
//!
//! - [`controller`] - The [`Controller`] lifecycle trait, [`ActionTable`] and arity checks
//! - [`registry`] - [`ControllerRegistry`], factories keyed by module and name
//! - [`builtins`] - The `pages` and `module` controllers behind the routing conventions
//! - [`views`] - [`ViewRenderer`] and the filesystem-backed [`FileViews`]
//! - [`dispatcher`] - [`Dispatcher`]: asset check, routing, controller lifecycle
//! - [`server`] - [`TrellisApp`], the axum integration

pub mod builtins;
pub mod controller;
pub mod dispatcher;
pub mod registry;
pub mod server;
pub mod views;

pub use controller::{ActionOutput, ActionTable, Arity, Controller, ControllerContext};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use registry::ControllerRegistry;
pub use server::TrellisApp;
pub use views::{FileViews, ViewRenderer};
