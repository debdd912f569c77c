//! URL routing: route definitions, the route table and the path parser.
//!
//! ## Modules
//!
//! - [`spec`] - Route patterns compiled into [`RouteSpec`] variants
//! - [`router`] - The route table, [`Router::parse`] and reverse URLs
//! - [`normalize`] - Path normalization and the positional convention
//! - [`static_pages`] - The `pages/<path>` view convention
//! - [`params`] - The [`ParsedParams`] output contract

pub mod normalize;
pub mod params;
pub mod router;
pub mod spec;
pub mod static_pages;

pub use params::ParsedParams;
pub use router::Router;
pub use spec::{Route, RouteSpec, RouteTarget};
pub use static_pages::ViewLocator;
