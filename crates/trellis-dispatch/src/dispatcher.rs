//! The per-request dispatch pipeline.
//!
//! Every request runs the same linear sequence, with no retries:
//!
//! ```text
//! asset check ─┬─> served
//!              └─> route parse -> module load -> controller resolve
//!                  -> startup -> action -> render | body assign -> shutdown
//!                  -> emit
//! ```
//!
//! Routing failures (`ModuleMissing`, `ControllerMissing`, `ActionMissing`,
//! `ArgumentMismatch`) are returned to the caller untouched; turning them into
//! an error page is the server layer's job.

use std::sync::Arc;

use trellis_core::logging::{new_request_id, request_span};
use trellis_core::{ModuleRegistry, Settings, TrellisError, TrellisResult};
use trellis_http::{AssetResolver, HttpRequest, HttpResponse, ResponseBody, Router};

use crate::controller::{ActionOutput, ControllerContext};
use crate::registry::ControllerRegistry;
use crate::views::{FileViews, ViewRenderer};

/// The result of a dispatch.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A full response to send to the client.
    Response(HttpResponse),
    /// The body only, for sub-requests.
    Body(ResponseBody),
}

impl DispatchOutcome {
    /// Returns the body regardless of the outcome kind.
    pub fn into_body(self) -> ResponseBody {
        match self {
            Self::Response(response) => response.into_body(),
            Self::Body(body) => body,
        }
    }
}

/// Sequences asset serving, routing and the controller lifecycle.
///
/// The router, registries and views are built once at startup and shared; a
/// dispatcher is safe to call from many threads at once.
pub struct Dispatcher {
    router: Arc<Router>,
    assets: AssetResolver,
    controllers: Arc<ControllerRegistry>,
    views: Arc<dyn ViewRenderer>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("assets", &self.assets)
            .field("controllers", &self.controllers)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher from its collaborators.
    pub fn new(
        router: Arc<Router>,
        assets: AssetResolver,
        controllers: Arc<ControllerRegistry>,
        views: Arc<dyn ViewRenderer>,
    ) -> Self {
        Self {
            router,
            assets,
            controllers,
            views,
        }
    }

    /// Wires a dispatcher from `settings`: module registry, filesystem views,
    /// router and asset resolver. `routes` registers the application's routes.
    ///
    /// # Errors
    ///
    /// Returns whatever error `routes` returns.
    pub fn from_settings<F>(
        settings: &Settings,
        controllers: ControllerRegistry,
        routes: F,
    ) -> TrellisResult<Self>
    where
        F: FnOnce(&mut Router) -> TrellisResult<()>,
    {
        let modules = Arc::new(ModuleRegistry::from_settings(settings));
        let views = Arc::new(FileViews::from_settings(settings, modules.clone()));

        let mut router = Router::new(modules.clone())
            .with_view_locator(views.clone())
            .auto_static_pages(settings.auto_static_pages);
        routes(&mut router)?;
        tracing::info!(routes = router.len(), "router configured");

        let assets = AssetResolver::from_settings(settings, modules);
        Ok(Self::new(Arc::new(router), assets, Arc::new(controllers), views))
    }

    /// Returns the router.
    pub const fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Returns the module registry shared with the router.
    pub fn modules(&self) -> &Arc<ModuleRegistry> {
        self.router.modules()
    }

    /// Returns the controller registry.
    pub const fn controllers(&self) -> &Arc<ControllerRegistry> {
        &self.controllers
    }

    /// Dispatches one request.
    ///
    /// # Errors
    ///
    /// Fails with `ModuleMissing` when the parsed module cannot be loaded,
    /// `ControllerMissing` when no controller is registered for the parsed
    /// name, `ActionMissing`/`ArgumentMismatch` when the action cannot be
    /// invoked, and with any error raised by the controller's hooks.
    pub fn dispatch(&self, request: HttpRequest) -> TrellisResult<DispatchOutcome> {
        let span = request_span(&new_request_id(), request.path());
        let _guard = span.enter();
        self.run(request)
    }

    /// Dispatches `path` as an internal sub-request and returns its body.
    ///
    /// # Errors
    ///
    /// Same as [`dispatch`](Self::dispatch).
    pub fn request_action(&self, path: &str) -> TrellisResult<ResponseBody> {
        let request = HttpRequest::builder().path(path).return_body(true).build();
        tracing::debug!(path = request.path(), "sub-request");
        self.dispatch(request).map(DispatchOutcome::into_body)
    }

    fn run(&self, mut request: HttpRequest) -> TrellisResult<DispatchOutcome> {
        let mut response = HttpResponse::new();
        let body_only = request.wants_body_only();

        if self.assets.try_serve(request.path(), &mut response)? {
            tracing::info!(status = response.status().as_u16(), "asset request handled");
            return Ok(emit(response, body_only));
        }

        let params = self.router.parse(request.path());

        if let Some(module) = params.module.as_deref() {
            let modules = self.router.modules();
            if !modules.load(module) || !modules.loaded(module) {
                return Err(TrellisError::ModuleMissing(module.to_string()));
            }
        }

        let mut controller = self
            .controllers
            .create(params.module.as_deref(), &params.controller)?;

        request.set_params(params.clone());
        let mut ctx = ControllerContext::new(request, response, params);

        controller.startup_process(&mut ctx)?;
        let action = ctx.params.action.clone();
        let pass = ctx.params.pass.clone();
        let output = controller.invoke(&action, &pass, &mut ctx)?;

        if ctx.auto_render() {
            controller.render(&mut ctx, self.views.as_ref())?;
        } else if !ctx.response.has_body() {
            if let ActionOutput::Body(body) = output {
                ctx.response.set_body(body);
            }
        }
        controller.shutdown_process(&mut ctx)?;

        tracing::info!(
            params = %ctx.params,
            status = ctx.response.status().as_u16(),
            "request dispatched"
        );
        let (_, response) = ctx.into_parts();
        Ok(emit(response, body_only))
    }
}

fn emit(response: HttpResponse, body_only: bool) -> DispatchOutcome {
    if body_only {
        DispatchOutcome::Body(response.into_body())
    } else {
        DispatchOutcome::Response(response)
    }
}
