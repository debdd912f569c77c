//! Route definitions.
//!
//! A route pattern is compiled once, at registration, into a [`RouteSpec`]:
//!
//! | pattern | spec |
//! |---|---|
//! | `/about` | `Literal("/about")` |
//! | `/admin/:controller` | `ControllerToken { prefix: "/admin/" }` |
//! | `/account/:action` | `ActionToken { prefix: "/account/" }` |
//! | `/api/*` | `Wildcard { prefix: "/api/" }` |
//!
//! Only the text before the token matters. A pattern mixing token kinds keeps
//! the first kind in the order `:controller`, `:action`, trailing `*`; such
//! patterns are accepted with a warning.

use serde::{Deserialize, Serialize};

use super::normalize::{normalize_path, path_segments, strip_route_prefix};
use super::params::{ParsedParams, DEFAULT_ACTION};

const CONTROLLER_TOKEN: &str = ":controller";
const ACTION_TOKEN: &str = ":action";

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSpec {
    /// Matches exactly one path.
    Literal(String),
    /// The segment after `prefix` names the controller, the next the action.
    ControllerToken {
        /// Literal text before `:controller`.
        prefix: String,
    },
    /// The segment after `prefix` names the action of the target's controller.
    ActionToken {
        /// Literal text before `:action`.
        prefix: String,
    },
    /// Everything after `prefix` is passed to the target's action.
    Wildcard {
        /// The pattern without its trailing `*`.
        prefix: String,
    },
}

impl RouteSpec {
    /// Compiles a normalized pattern.
    pub fn compile(pattern: &str) -> Self {
        let has_controller = pattern.contains(CONTROLLER_TOKEN);
        let has_action = pattern.contains(ACTION_TOKEN);
        let is_wildcard = pattern.ends_with('*');

        let kinds = usize::from(has_controller) + usize::from(has_action) + usize::from(is_wildcard);
        if kinds > 1 {
            tracing::warn!(
                pattern,
                "route pattern mixes placeholder kinds; only the first of :controller, :action, * applies"
            );
        }

        if let Some(idx) = pattern.find(CONTROLLER_TOKEN) {
            Self::ControllerToken {
                prefix: pattern[..idx].to_string(),
            }
        } else if let Some(idx) = pattern.find(ACTION_TOKEN) {
            Self::ActionToken {
                prefix: pattern[..idx].to_string(),
            }
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            Self::Wildcard {
                prefix: prefix.to_string(),
            }
        } else {
            Self::Literal(pattern.to_string())
        }
    }

    /// Returns `true` for literal routes.
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

/// The target a route maps to.
///
/// # Examples
///
/// ```
/// use trellis_http::routing::RouteTarget;
///
/// let target = RouteTarget::controller("pages")
///     .action("display")
///     .with("page", "home");
/// let params = target.normalize();
/// assert_eq!(params.action, "display");
/// assert_eq!(params.pass, vec!["home".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTarget {
    /// Dotted module name.
    pub module: Option<String>,
    /// Controller name. Optional only for `:controller` routes.
    pub controller: Option<String>,
    /// Action name, `"index"` when absent.
    pub action: Option<String>,
    /// Extra key/value pairs; their values are the default passed arguments.
    pub extra: Vec<(String, String)>,
}

impl RouteTarget {
    /// Creates a target for the given controller.
    pub fn controller(controller: impl Into<String>) -> Self {
        Self {
            controller: Some(controller.into()),
            ..Self::default()
        }
    }

    /// Sets the action.
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Sets the module.
    #[must_use]
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Adds an extra key/value pair.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Returns the action, defaulting to `"index"`.
    pub fn action_or_default(&self) -> &str {
        self.action.as_deref().unwrap_or(DEFAULT_ACTION)
    }

    /// Converts the target to parsed parameters: defaults applied, extra values
    /// as `pass` in insertion order.
    pub fn normalize(&self) -> ParsedParams {
        ParsedParams {
            module: self.module.clone(),
            controller: self.controller.clone().unwrap_or_default(),
            action: self.action_or_default().to_string(),
            pass: self.extra.iter().map(|(_, v)| v.clone()).collect(),
        }
    }
}

/// A registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pattern: String,
    spec: RouteSpec,
    target: RouteTarget,
}

impl Route {
    /// Builds a route from a pattern (normalized to a leading `/`) and target.
    pub fn new(pattern: &str, target: RouteTarget) -> Self {
        let pattern = normalize_path(pattern);
        let spec = RouteSpec::compile(&pattern);
        Self {
            pattern,
            spec,
            target,
        }
    }

    /// Returns the normalized pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the compiled spec.
    pub const fn spec(&self) -> &RouteSpec {
        &self.spec
    }

    /// Returns the target.
    pub const fn target(&self) -> &RouteTarget {
        &self.target
    }

    /// Matches a token or wildcard route against a normalized path.
    ///
    /// Literal routes never match here; they are looked up by key before the
    /// token scan. Returns `None` when the prefix condition fails so the scan
    /// can move on to the next route.
    pub fn match_path(&self, path: &str) -> Option<ParsedParams> {
        match &self.spec {
            RouteSpec::Literal(_) => None,
            RouteSpec::ControllerToken { prefix } => {
                let rest = strip_route_prefix(path, prefix)?;
                let mut segments = path_segments(rest);
                let controller = segments.next()?;
                let action = segments.next().unwrap_or(DEFAULT_ACTION);
                Some(ParsedParams {
                    module: self.target.module.clone(),
                    controller: controller.to_string(),
                    action: action.to_string(),
                    pass: segments.map(String::from).collect(),
                })
            }
            RouteSpec::ActionToken { prefix } => {
                let rest = strip_route_prefix(path, prefix)?;
                let mut segments = path_segments(rest);
                let action = segments.next().unwrap_or(DEFAULT_ACTION);
                Some(ParsedParams {
                    module: self.target.module.clone(),
                    controller: self.target.controller.clone().unwrap_or_default(),
                    action: action.to_string(),
                    pass: segments.map(String::from).collect(),
                })
            }
            RouteSpec::Wildcard { prefix } => {
                let rest = strip_route_prefix(path, prefix)?;
                Some(ParsedParams {
                    pass: path_segments(rest).map(String::from).collect(),
                    ..self.target.normalize()
                })
            }
        }
    }
}
