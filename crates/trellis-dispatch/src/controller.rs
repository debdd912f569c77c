//! Controllers and their action tables.
//!
//! A controller is created fresh for every request by a factory in the
//! [`ControllerRegistry`](crate::registry::ControllerRegistry). The dispatcher
//! drives it through a fixed lifecycle:
//!
//! 1. [`Controller::startup_process`]
//! 2. [`Controller::invoke`] with the parsed action and passed arguments
//! 3. [`Controller::render`] when auto-render is on, otherwise the action's
//!    returned body fills an unset response body
//! 4. [`Controller::shutdown_process`]
//!
//! Actions are declared in an [`ActionTable`] with an [`Arity`], so a request
//! naming an unknown action or passing the wrong number of arguments fails
//! with a typed error before any controller code runs.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use trellis_core::utils::text::underscore;
use trellis_core::{TrellisError, TrellisResult};
use trellis_http::routing::ParsedParams;
use trellis_http::{HttpRequest, HttpResponse};

use crate::views::ViewRenderer;

/// Per-request state handed to every controller hook.
#[derive(Debug)]
pub struct ControllerContext {
    /// The current request.
    pub request: HttpRequest,
    /// The response being built.
    pub response: HttpResponse,
    /// The routing parameters that selected this controller.
    pub params: ParsedParams,
    vars: HashMap<String, serde_json::Value>,
    auto_render: bool,
    view: Option<String>,
}

impl ControllerContext {
    /// Creates a context with auto-render enabled and no view variables.
    pub fn new(request: HttpRequest, response: HttpResponse, params: ParsedParams) -> Self {
        Self {
            request,
            response,
            params,
            vars: HashMap::new(),
            auto_render: true,
            view: None,
        }
    }

    /// Sets a view variable. Values that fail to serialize are stored as null.
    pub fn set(&mut self, key: impl Into<String>, value: impl Serialize) {
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        self.vars.insert(key.into(), value);
    }

    /// Returns a view variable.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.vars.get(key)
    }

    /// Returns all view variables.
    pub const fn vars(&self) -> &HashMap<String, serde_json::Value> {
        &self.vars
    }

    /// Returns whether the view is rendered after the action.
    pub const fn auto_render(&self) -> bool {
        self.auto_render
    }

    /// Turns auto-render on or off.
    pub fn set_auto_render(&mut self, enabled: bool) {
        self.auto_render = enabled;
    }

    /// Overrides the view rendered after the action.
    pub fn set_view(&mut self, view: impl Into<String>) {
        self.view = Some(view.into());
    }

    /// Returns the view to render: the override, or `<controller>/<action>`.
    pub fn view_name(&self) -> String {
        self.view.clone().unwrap_or_else(|| {
            format!("{}/{}", underscore(&self.params.controller), self.params.action)
        })
    }

    /// Returns the module the request targets, if any.
    pub fn module(&self) -> Option<&str> {
        self.params.module.as_deref()
    }

    /// Splits the context into its request and response.
    pub fn into_parts(self) -> (HttpRequest, HttpResponse) {
        (self.request, self.response)
    }
}

/// What an action hands back to the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActionOutput {
    /// Nothing; the response is built by rendering or by the action itself.
    #[default]
    None,
    /// A raw body, used when auto-render is off and no body was set.
    Body(String),
}

impl From<()> for ActionOutput {
    fn from((): ()) -> Self {
        Self::None
    }
}

impl From<String> for ActionOutput {
    fn from(body: String) -> Self {
        Self::Body(body)
    }
}

impl From<&str> for ActionOutput {
    fn from(body: &str) -> Self {
        Self::Body(body.to_string())
    }
}

/// The number of passed arguments an action accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` arguments.
    Exact(usize),
    /// `n` or more arguments.
    AtLeast(usize),
    /// Between `min` and `max` arguments, inclusive.
    Between(usize, usize),
}

impl Arity {
    /// Returns `true` if `given` arguments are acceptable.
    pub const fn accepts(self, given: usize) -> bool {
        match self {
            Self::Exact(n) => given == n,
            Self::AtLeast(n) => given >= n,
            Self::Between(min, max) => given >= min && given <= max,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::AtLeast(n) => write!(f, "{n}.."),
            Self::Between(min, max) => write!(f, "{min}..={max}"),
        }
    }
}

/// An action implementation.
pub type ActionFn<C> =
    fn(&mut C, &mut ControllerContext, &[String]) -> TrellisResult<ActionOutput>;

/// The actions a controller exposes, by name.
///
/// # Examples
///
/// ```
/// use trellis_dispatch::controller::{ActionOutput, ActionTable, Arity, ControllerContext};
/// use trellis_core::TrellisResult;
///
/// struct Posts;
///
/// impl Posts {
///     fn view(&mut self, _ctx: &mut ControllerContext, args: &[String]) -> TrellisResult<ActionOutput> {
///         Ok(format!("post {}", args[0]).into())
///     }
/// }
///
/// let table = ActionTable::new("Posts").action("view", Arity::Exact(1), Posts::view);
/// assert!(table.contains("view"));
/// assert!(table.check("view", 2).is_err());
/// ```
pub struct ActionTable<C> {
    controller: &'static str,
    actions: HashMap<&'static str, (Arity, ActionFn<C>)>,
}

impl<C> fmt::Debug for ActionTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.actions.keys().collect();
        names.sort();
        f.debug_struct("ActionTable")
            .field("controller", &self.controller)
            .field("actions", &names)
            .finish()
    }
}

impl<C> ActionTable<C> {
    /// Creates an empty table for the named controller.
    pub fn new(controller: &'static str) -> Self {
        Self {
            controller,
            actions: HashMap::new(),
        }
    }

    /// Adds an action.
    #[must_use]
    pub fn action(mut self, name: &'static str, arity: Arity, f: ActionFn<C>) -> Self {
        self.actions.insert(name, (arity, f));
        self
    }

    /// Returns `true` if the table has an action called `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Returns the action names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.actions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Validates an invocation without running it.
    pub fn check(&self, name: &str, given: usize) -> TrellisResult<ActionFn<C>> {
        let Some((arity, f)) = self.actions.get(name) else {
            return Err(TrellisError::ActionMissing {
                controller: self.controller.to_string(),
                action: name.to_string(),
            });
        };
        if !arity.accepts(given) {
            return Err(TrellisError::ArgumentMismatch {
                action: format!("{}::{name}", self.controller),
                expected: arity.to_string(),
                given,
            });
        }
        Ok(*f)
    }

    /// Validates and runs an action.
    pub fn call(
        &self,
        controller: &mut C,
        name: &str,
        args: &[String],
        ctx: &mut ControllerContext,
    ) -> TrellisResult<ActionOutput> {
        let f = self.check(name, args.len())?;
        f(controller, ctx, args)
    }
}

/// A request handler driven through the dispatch lifecycle.
pub trait Controller: Send {
    /// Hook run before the action.
    fn startup_process(&mut self, _ctx: &mut ControllerContext) -> TrellisResult<()> {
        Ok(())
    }

    /// Runs `action` with the passed arguments.
    ///
    /// Implementations normally delegate to an [`ActionTable`] so unknown
    /// actions and wrong argument counts surface as typed errors.
    fn invoke(
        &mut self,
        action: &str,
        args: &[String],
        ctx: &mut ControllerContext,
    ) -> TrellisResult<ActionOutput>;

    /// Renders the context's view into the response body.
    fn render(&mut self, ctx: &mut ControllerContext, views: &dyn ViewRenderer) -> TrellisResult<()> {
        let html = views.render(&ctx.view_name(), ctx.module(), ctx.vars())?;
        ctx.response.set_body(html);
        Ok(())
    }

    /// Hook run after rendering.
    fn shutdown_process(&mut self, _ctx: &mut ControllerContext) -> TrellisResult<()> {
        Ok(())
    }
}
