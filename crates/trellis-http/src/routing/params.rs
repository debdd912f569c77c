//! Parsed request parameters: the router's output contract.

use serde::{Deserialize, Serialize};

/// The action used when a route or path names none.
pub const DEFAULT_ACTION: &str = "index";

/// The result of routing a path.
///
/// Every branch of [`Router::parse`](super::Router::parse) produces all four
/// fields. `controller` is empty only when the path carried no segment at all
/// and no module applied; the dispatcher then fails with `ControllerMissing`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedParams {
    /// Dotted module name, if the request targets a module.
    pub module: Option<String>,
    /// Controller name as it appeared in the URL or route target.
    pub controller: String,
    /// Action name, `"index"` unless given.
    pub action: String,
    /// Positional arguments forwarded to the action.
    pub pass: Vec<String>,
}

impl ParsedParams {
    /// Creates parameters from their parts.
    pub fn new(
        module: Option<String>,
        controller: impl Into<String>,
        action: impl Into<String>,
        pass: Vec<String>,
    ) -> Self {
        Self {
            module,
            controller: controller.into(),
            action: action.into(),
            pass,
        }
    }
}

impl std::fmt::Display for ParsedParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(module) = &self.module {
            write!(f, "{module}:")?;
        }
        write!(f, "{}::{}({})", self.controller, self.action, self.pass.join(", "))
    }
}
