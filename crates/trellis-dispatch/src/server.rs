//! HTTP server integration for trellis.
//!
//! This module provides [`TrellisApp`], which puts a [`Dispatcher`] behind an
//! axum router. The primary application webroot is served directly by
//! [`ServeDir`], standing in for the front-end web server; every other request
//! falls through to the dispatcher, which runs on the blocking thread pool.
//!
//! Fatal dispatch errors become error responses here, using
//! [`TrellisError::status_code`]. In debug mode the error message is sent as
//! the body.
//!
//! # Examples
//!
//! ```no_run
//! use trellis_core::Settings;
//! use trellis_dispatch::registry::ControllerRegistry;
//! use trellis_dispatch::server::TrellisApp;
//! use trellis_http::routing::RouteTarget;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = TrellisApp::from_settings(Settings::default(), ControllerRegistry::with_builtins(), |router| {
//!     router.connect("/", RouteTarget::controller("pages").action("display").with("page", "home"))
//! })?;
//!
//! // app.run("0.0.0.0:8000").await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::handler::HandlerWithoutStateExt;
use axum::response::IntoResponse;
use http::StatusCode;
use tower_http::services::ServeDir;

use trellis_core::{Settings, TrellisError, TrellisResult};
use trellis_http::routing::Router;
use trellis_http::{HttpRequest, HttpResponse};

use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::registry::ControllerRegistry;

/// The main application type for trellis.
pub struct TrellisApp {
    settings: Settings,
    dispatcher: Arc<Dispatcher>,
}

impl TrellisApp {
    /// Creates an application around an existing dispatcher.
    pub const fn new(settings: Settings, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            settings,
            dispatcher,
        }
    }

    /// Builds the dispatcher from `settings` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns whatever error `routes` returns.
    pub fn from_settings<F>(
        settings: Settings,
        controllers: ControllerRegistry,
        routes: F,
    ) -> TrellisResult<Self>
    where
        F: FnOnce(&mut Router) -> TrellisResult<()>,
    {
        let dispatcher = Dispatcher::from_settings(&settings, controllers, routes)?;
        Ok(Self::new(settings, Arc::new(dispatcher)))
    }

    /// Returns a reference to the application settings.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the dispatcher.
    pub const fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Converts the application into an axum router.
    pub fn into_axum_router(self) -> axum::Router {
        let webroot = self.settings.app_webroot();
        let settings = Arc::new(self.settings);
        let dispatcher = self.dispatcher;

        let handler = move |req: Request<Body>| {
            let dispatcher = dispatcher.clone();
            let settings = settings.clone();

            async move {
                let request = match read_request(req, &settings.base_url).await {
                    Ok(request) => request,
                    Err(e) => return error_response(&e, settings.debug).into_response(),
                };

                let result =
                    tokio::task::spawn_blocking(move || dispatcher.dispatch(request)).await;
                let response = match result {
                    Ok(Ok(outcome)) => outcome_response(outcome),
                    Ok(Err(e)) => error_response(&e, settings.debug),
                    Err(e) => error_response(
                        &TrellisError::InternalServerError(format!("dispatch task failed: {e}")),
                        settings.debug,
                    ),
                };
                response.into_response()
            }
        };

        let serve_dir = ServeDir::new(webroot)
            .call_fallback_on_method_not_allowed(true)
            .fallback(handler.into_service());

        axum::Router::new().fallback_service(serve_dir)
    }

    /// Runs the application as an HTTP server on the given address.
    ///
    /// Installs the logging subscriber described by the settings first.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the address or encounters
    /// a runtime error.
    pub async fn run(self, addr: &str) -> TrellisResult<()> {
        trellis_core::logging::setup_logging(&self.settings);
        let debug = self.settings.debug;
        let router = self.into_axum_router();
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            TrellisError::ImproperlyConfigured(format!("Failed to bind to {addr}: {e}"))
        })?;

        if debug {
            tracing::info!("Starting development server at http://{addr}/");
        }

        axum::serve(listener, router)
            .await
            .map_err(|e| TrellisError::InternalServerError(format!("Server error: {e}")))?;

        Ok(())
    }
}

impl std::fmt::Debug for TrellisApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrellisApp")
            .field("routes", &self.dispatcher.router().len())
            .field("controllers", &self.dispatcher.controllers().len())
            .field("loaded_modules", &self.dispatcher.modules().loaded_count())
            .field("debug", &self.settings.debug)
            .finish()
    }
}

/// Collects the body and converts an axum request for the dispatcher.
async fn read_request(req: Request<Body>, base_url: &str) -> TrellisResult<HttpRequest> {
    let (parts, body) = req.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| TrellisError::BadRequest(format!("failed to read request body: {e}")))?;
    Ok(HttpRequest::from_axum(parts, body.to_vec(), base_url))
}

fn outcome_response(outcome: DispatchOutcome) -> HttpResponse {
    match outcome {
        DispatchOutcome::Response(response) => response,
        DispatchOutcome::Body(body) => {
            let mut response = HttpResponse::new();
            response.set_body(body);
            response
        }
    }
}

/// Converts a fatal dispatch error into a response.
pub fn error_response(error: &TrellisError, debug: bool) -> HttpResponse {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if error.is_routing_error() {
        tracing::warn!(error = %error, "no route to a controller action");
    } else if status.is_server_error() {
        tracing::error!(error = %error, "request failed");
    } else {
        tracing::warn!(error = %error, "request rejected");
    }

    let body = if debug {
        error.to_string()
    } else {
        status.canonical_reason().unwrap_or("Error").to_string()
    };
    HttpResponse::with_status(status, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_debug_shows_message() {
        let err = TrellisError::ControllerMissing {
            module: None,
            controller: "Users".into(),
        };
        let response = error_response(&err, true);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.body().to_text().contains("Users"));
    }

    #[test]
    fn test_error_response_hides_message_in_production() {
        let err = TrellisError::TemplateError("secret path".into());
        let response = error_response(&err, false);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body().to_text(), "Internal Server Error");
    }

    #[test]
    fn test_error_response_routing_error_is_not_found() {
        let err = TrellisError::ArgumentMismatch {
            action: "Posts::view".into(),
            expected: "1".into(),
            given: 0,
        };
        assert!(err.is_routing_error());
        assert_eq!(error_response(&err, false).status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_read_request_strips_base_url() {
        let req = http::Request::builder()
            .uri("/app/posts/view/3")
            .body(Body::from("payload"))
            .unwrap();
        let request = read_request(req, "/app").await.unwrap();
        assert_eq!(request.path(), "/posts/view/3");
        assert_eq!(request.body(), b"payload");
    }

    #[tokio::test]
    async fn test_unreadable_body_is_bad_request() {
        let limited = http_body_util::Limited::new(
            http_body_util::Full::new(axum::body::Bytes::from_static(b"oversized")),
            1,
        );
        let req = http::Request::builder()
            .uri("/posts")
            .body(Body::new(limited))
            .unwrap();

        let err = read_request(req, "").await.unwrap_err();
        assert!(matches!(err, TrellisError::BadRequest(_)));
        assert_eq!(error_response(&err, false).status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unreadable_body_never_reaches_dispatcher() {
        use tower::ServiceExt;

        let app = TrellisApp::from_settings(Settings::default(), ControllerRegistry::with_builtins(), |_| Ok(()))
            .unwrap();
        let limited = http_body_util::Limited::new(
            http_body_util::Full::new(axum::body::Bytes::from_static(b"oversized")),
            1,
        );
        let req = http::Request::builder()
            .uri("/missing/route")
            .body(Body::new(limited))
            .unwrap();

        let response = app.into_axum_router().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_outcome_body_becomes_ok_response() {
        let response = outcome_response(DispatchOutcome::Body("partial".into()));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().to_text(), "partial");
    }

    #[test]
    fn test_from_settings_propagates_route_errors() {
        let result = TrellisApp::from_settings(Settings::default(), ControllerRegistry::new(), |router| {
            router.connect("/broken", trellis_http::routing::RouteTarget::default())
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_invalid_address() {
        let app = TrellisApp::from_settings(Settings::default(), ControllerRegistry::new(), |_| Ok(()))
            .unwrap();
        let result = app.run("invalid-address").await;
        assert!(result.is_err());
    }
}
