//! Generic multi-view composite.
//!
//! DESIGN
//! ======
//! `DataView` owns one list's view configs and the boundary for its views.
//! Request handlers render through [`DataView::present_with`] instead,
//! passing the page's long-lived boundary.
//! Empty data short-circuits to an empty state before any view is touched.
//! Otherwise the active view renders inside its own boundary slot so a
//! faulty config or row only replaces that view with a fallback.

use std::sync::Arc;

use serde::Serialize;

use super::ViewType;
use super::boundary::{BoundaryOutcome, ErrorBoundary, Fallback, RenderError};
use super::canvas::{self, CanvasModel};
use super::config::{RowId, ViewConfigs};
use super::grid::{self, GridModel};
use super::kanban::{self, KanbanModel};
use super::preference::PreferenceStore;
use super::switcher::{SwitcherError, SwitcherSnapshot, ViewSwitcher};
use super::table::{self, TableModel};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyState {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_label: Option<String>,
}

impl EmptyState {
    #[must_use]
    pub fn new(title: &str, description: &str) -> Self {
        Self { title: title.to_owned(), description: description.to_owned(), action_label: None }
    }

    #[must_use]
    pub fn with_action(mut self, label: &str) -> Self {
        self.action_label = Some(label.to_owned());
        self
    }
}

impl Default for EmptyState {
    fn default() -> Self {
        Self::new("Nothing here yet", "Items you add will show up here.")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewBody {
    Empty(EmptyState),
    Table(TableModel),
    Grid(GridModel),
    Kanban(KanbanModel),
    Canvas(CanvasModel),
    Fallback(Fallback),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataViewModel {
    pub switcher: SwitcherSnapshot,
    pub body: ViewBody,
}

pub struct DataView<T> {
    configs: ViewConfigs<T>,
    empty_state: Option<EmptyState>,
    boundary: ErrorBoundary,
}

impl<T: RowId> DataView<T> {
    #[must_use]
    pub fn new(configs: ViewConfigs<T>) -> Self {
        Self { configs, empty_state: None, boundary: ErrorBoundary::new() }
    }

    #[must_use]
    pub fn with_empty_state(mut self, empty: EmptyState) -> Self {
        self.empty_state = Some(empty);
        self
    }

    #[must_use]
    pub fn configs(&self) -> &ViewConfigs<T> {
        &self.configs
    }

    #[must_use]
    pub fn available(&self) -> Vec<ViewType> {
        self.configs.available()
    }

    /// Mount a switcher over this view's configured views.
    ///
    /// # Errors
    ///
    /// Returns [`SwitcherError::NoViews`] when nothing is configured.
    pub async fn mount_switcher(
        &self,
        key: &str,
        default: ViewType,
        store: Arc<dyn PreferenceStore>,
    ) -> Result<ViewSwitcher, SwitcherError> {
        ViewSwitcher::mount(key, self.available(), default, store).await
    }

    /// Render `rows` with `active`.
    pub fn render(&mut self, rows: &[T], active: ViewType) -> ViewBody {
        render_body(&self.configs, self.empty_state.as_ref(), &mut self.boundary, rows, active)
    }

    /// Render with the switcher's active view.
    pub fn present(&mut self, rows: &[T], switcher: &ViewSwitcher) -> DataViewModel {
        DataViewModel { switcher: switcher.snapshot(), body: self.render(rows, switcher.active()) }
    }

    /// Like [`present`](Self::present), tripping and honoring `boundary`
    /// instead of the view's own.
    pub fn present_with(&self, rows: &[T], switcher: &ViewSwitcher, boundary: &mut ErrorBoundary) -> DataViewModel {
        let body = render_body(&self.configs, self.empty_state.as_ref(), boundary, rows, switcher.active());
        DataViewModel { switcher: switcher.snapshot(), body }
    }

    /// Retry affordance: clears the boundary slot only.
    pub fn reset(&mut self, view: ViewType) {
        self.boundary.reset(view);
    }
}

fn render_body<T: RowId>(
    configs: &ViewConfigs<T>,
    empty_state: Option<&EmptyState>,
    boundary: &mut ErrorBoundary,
    rows: &[T],
    active: ViewType,
) -> ViewBody {
    if rows.is_empty() {
        return ViewBody::Empty(empty_state.cloned().unwrap_or_default());
    }

    let outcome = boundary.run(active, || match active {
        ViewType::Table => table::render(missing(configs.table.as_ref(), active)?, rows).map(ViewBody::Table),
        ViewType::Grid => grid::render(missing(configs.grid.as_ref(), active)?, rows).map(ViewBody::Grid),
        ViewType::Kanban => kanban::render(missing(configs.kanban.as_ref(), active)?, rows).map(ViewBody::Kanban),
        ViewType::Canvas => canvas::render(missing(configs.canvas.as_ref(), active)?, rows).map(ViewBody::Canvas),
    });

    match outcome {
        BoundaryOutcome::Rendered(body) => body,
        BoundaryOutcome::Fallback(fallback) => ViewBody::Fallback(fallback),
    }
}

fn missing<C>(config: Option<&C>, view: ViewType) -> Result<&C, RenderError> {
    config.ok_or_else(|| RenderError::Misconfigured(format!("{view} view is not configured")))
}

#[cfg(test)]
#[path = "data_view_test.rs"]
mod tests;
