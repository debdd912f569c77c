//! Framework controllers behind the routing conventions.
//!
//! - `pages` / `display` serves static pages found by the router: the passed
//!   path names a view under `pages/`.
//! - `module` / `display` serves a module's landing view, `index`.

use std::sync::OnceLock;

use trellis_core::utils::text::capfirst;
use trellis_core::{TrellisError, TrellisResult};
use trellis_http::routing::normalize::DISPLAY_ACTION;
use trellis_http::routing::static_pages::{page_view_path, PAGES_VIEW_DIR};

use crate::controller::{ActionOutput, ActionTable, Arity, Controller, ControllerContext};
use crate::views::ViewRenderer;

/// View rendered for a module landing page.
pub const MODULE_INDEX_VIEW: &str = "index";

/// Serves views under `pages/`.
#[derive(Debug, Default)]
pub struct PagesController;

impl PagesController {
    fn actions() -> &'static ActionTable<Self> {
        static ACTIONS: OnceLock<ActionTable<PagesController>> = OnceLock::new();
        ACTIONS.get_or_init(|| {
            ActionTable::new("Pages").action(DISPLAY_ACTION, Arity::AtLeast(1), Self::display)
        })
    }

    fn display(&mut self, ctx: &mut ControllerContext, args: &[String]) -> TrellisResult<ActionOutput> {
        let page = args
            .iter()
            .flat_map(|a| a.split('/'))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        if page.is_empty() {
            return Err(TrellisError::NotFound(format!("{PAGES_VIEW_DIR}/")));
        }

        let title = page
            .rsplit('/')
            .next()
            .map(|last| capfirst(&last.replace(['_', '-'], " ")))
            .unwrap_or_default();
        ctx.set("page", &page);
        ctx.set("title", title);
        ctx.set_view(page_view_path(&page));
        Ok(ActionOutput::None)
    }
}

impl Controller for PagesController {
    fn invoke(
        &mut self,
        action: &str,
        args: &[String],
        ctx: &mut ControllerContext,
    ) -> TrellisResult<ActionOutput> {
        Self::actions().call(self, action, args, ctx)
    }

    fn render(&mut self, ctx: &mut ControllerContext, views: &dyn ViewRenderer) -> TrellisResult<()> {
        let view = ctx.view_name();
        if !views.location_exists(&view, ctx.module()) {
            return Err(TrellisError::NotFound(view));
        }
        let html = views.render(&view, ctx.module(), ctx.vars())?;
        ctx.response.set_body(html);
        Ok(())
    }
}

/// Serves a module's landing view.
#[derive(Debug, Default)]
pub struct ModuleController;

impl ModuleController {
    fn actions() -> &'static ActionTable<Self> {
        static ACTIONS: OnceLock<ActionTable<ModuleController>> = OnceLock::new();
        ACTIONS.get_or_init(|| {
            ActionTable::new("Module").action(DISPLAY_ACTION, Arity::Exact(0), Self::display)
        })
    }

    fn display(&mut self, ctx: &mut ControllerContext, _args: &[String]) -> TrellisResult<ActionOutput> {
        let Some(module) = ctx.module().map(String::from) else {
            return Err(TrellisError::NotFound("module landing page outside a module".into()));
        };
        ctx.set("module", module);
        ctx.set_view(MODULE_INDEX_VIEW);
        Ok(ActionOutput::None)
    }
}

impl Controller for ModuleController {
    fn invoke(
        &mut self,
        action: &str,
        args: &[String],
        ctx: &mut ControllerContext,
    ) -> TrellisResult<ActionOutput> {
        Self::actions().call(self, action, args, ctx)
    }
}
