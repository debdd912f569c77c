//! # trellis-http
//!
//! HTTP layer for the trellis framework. Provides Request and Response types,
//! the route table and path parser, and static asset resolution.
//!
//! ## Modules
//!
//! - [`request`] - [`HttpRequest`] and its builder
//! - [`response`] - [`HttpResponse`] and axum conversion
//! - [`routing`] - Route table, pattern matching and reverse routing
//! - [`assets`] - Static files under the application and module webroots

pub mod assets;
pub mod request;
pub mod response;
pub mod routing;

pub use assets::{Asset, AssetResolver};
pub use request::HttpRequest;
pub use response::{HttpResponse, ResponseBody};
pub use routing::{ParsedParams, Router};
