//! View presentation layer for admin list pages.
//!
//! DESIGN
//! ======
//! A list page hands rows plus a dictionary of per-view configs to
//! [`data_view::DataView`]. The configured keys decide which views are
//! available; [`switcher::ViewSwitcher`] decides which one is active and
//! persists that choice through an injected [`preference::PreferenceStore`].
//! Renderers project rows into serializable models so any front end can
//! draw them without re-deriving layout decisions.

pub mod boundary;
pub mod canvas;
pub mod config;
pub mod data_view;
pub mod grid;
pub mod kanban;
pub mod preference;
pub mod switcher;
pub mod table;

use serde::{Deserialize, Serialize};

/// Closed set of presentations a list can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    Table,
    Grid,
    Kanban,
    Canvas,
}

impl ViewType {
    /// Canonical toolbar order.
    pub const ALL: [Self; 4] = [Self::Table, Self::Grid, Self::Kanban, Self::Canvas];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Grid => "grid",
            Self::Kanban => "kanban",
            Self::Canvas => "canvas",
        }
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "table" => Some(Self::Table),
            "grid" => Some(Self::Grid),
            "kanban" => Some(Self::Kanban),
            "canvas" => Some(Self::Canvas),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Table => "Table",
            Self::Grid => "Grid",
            Self::Kanban => "Board",
            Self::Canvas => "Canvas",
        }
    }
}

impl std::fmt::Display for ViewType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a comma-separated view list such as `"table,grid"`, skipping
/// unknown names and duplicates.
#[must_use]
pub fn parse_view_list(raw: &str) -> Vec<ViewType> {
    let mut out = Vec::new();
    for view in raw.split(',').filter_map(|part| ViewType::from_str(part.trim())) {
        if !out.contains(&view) {
            out.push(view);
        }
    }
    out
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
