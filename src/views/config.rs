//! Declarative per-view configuration.
//!
//! Configs are built fresh by each list page and carry typed accessors over
//! the page's row type `T`; they have no identity of their own.

use serde::Serialize;
use uuid::Uuid;

use super::ViewType;

/// Typed projection of a row into display text.
pub type Accessor<T> = Box<dyn Fn(&T) -> String + Send + Sync>;

/// Rows shown in any view expose a stable identifier.
pub trait RowId {
    fn row_id(&self) -> Uuid;
}

// =============================================================================
// TABLE
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// One table column: header text plus a typed cell accessor.
pub struct Column<T> {
    pub key: String,
    pub header: String,
    pub align: Align,
    accessor: Accessor<T>,
}

impl<T> Column<T> {
    pub fn new(key: &str, header: &str, accessor: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        Self { key: key.to_owned(), header: header.to_owned(), align: Align::Left, accessor: Box::new(accessor) }
    }

    #[must_use]
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn cell(&self, row: &T) -> String {
        (self.accessor)(row)
    }
}

pub struct TableConfig<T> {
    pub columns: Vec<Column<T>>,
}

impl<T> TableConfig<T> {
    #[must_use]
    pub fn new(columns: Vec<Column<T>>) -> Self {
        Self { columns }
    }
}

// =============================================================================
// CARDS
// =============================================================================

/// How a row becomes a card (grid tiles, kanban cards, canvas stickies).
pub struct CardConfig<T> {
    title: Accessor<T>,
    subtitle: Option<Accessor<T>>,
    body: Option<Accessor<T>>,
    badges: Option<Box<dyn Fn(&T) -> Vec<String> + Send + Sync>>,
}

impl<T> CardConfig<T> {
    pub fn new(title: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        Self { title: Box::new(title), subtitle: None, body: None, badges: None }
    }

    #[must_use]
    pub fn subtitle(mut self, f: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.subtitle = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn body(mut self, f: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.body = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn badges(mut self, f: impl Fn(&T) -> Vec<String> + Send + Sync + 'static) -> Self {
        self.badges = Some(Box::new(f));
        self
    }

    pub fn card(&self, row: &T) -> Card
    where
        T: RowId,
    {
        Card {
            id: row.row_id(),
            title: (self.title)(row),
            subtitle: self.subtitle.as_ref().map(|f| f(row)).filter(|s| !s.is_empty()),
            body: self.body.as_ref().map(|f| f(row)).filter(|s| !s.is_empty()),
            badges: self.badges.as_ref().map(|f| f(row)).unwrap_or_default(),
        }
    }
}

/// Rendered card, shared by grid, kanban and canvas models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub badges: Vec<String>,
}

// =============================================================================
// KANBAN
// =============================================================================

/// Caller-defined kanban column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KanbanGroup {
    pub id: String,
    pub label: String,
    pub color: String,
}

impl KanbanGroup {
    #[must_use]
    pub fn new(id: &str, label: &str, color: &str) -> Self {
        Self { id: id.to_owned(), label: label.to_owned(), color: color.to_owned() }
    }
}

pub struct KanbanConfig<T> {
    pub groups: Vec<KanbanGroup>,
    pub card: CardConfig<T>,
    group_by: Accessor<T>,
}

impl<T> KanbanConfig<T> {
    pub fn new(
        groups: Vec<KanbanGroup>,
        group_by: impl Fn(&T) -> String + Send + Sync + 'static,
        card: CardConfig<T>,
    ) -> Self {
        Self { groups, card, group_by: Box::new(group_by) }
    }

    pub fn group_of(&self, row: &T) -> String {
        (self.group_by)(row)
    }
}

// =============================================================================
// CANVAS
// =============================================================================

/// Named region of a canvas layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanvasBlockDef {
    pub key: String,
    pub label: String,
}

impl CanvasBlockDef {
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self { key: key.to_owned(), label: label.to_owned() }
    }
}

pub struct CanvasConfig<T> {
    pub blocks: Vec<CanvasBlockDef>,
    pub card: CardConfig<T>,
    block_of: Box<dyn Fn(&T) -> Option<String> + Send + Sync>,
}

impl<T> CanvasConfig<T> {
    pub fn new(
        blocks: Vec<CanvasBlockDef>,
        block_of: impl Fn(&T) -> Option<String> + Send + Sync + 'static,
        card: CardConfig<T>,
    ) -> Self {
        Self { blocks, card, block_of: Box::new(block_of) }
    }

    pub fn block_of(&self, row: &T) -> Option<String> {
        (self.block_of)(row)
    }
}

// =============================================================================
// VIEW CONFIG DICTIONARY
// =============================================================================

/// Per-view configs for one list. Present entries define the available views.
pub struct ViewConfigs<T> {
    pub table: Option<TableConfig<T>>,
    pub grid: Option<CardConfig<T>>,
    pub kanban: Option<KanbanConfig<T>>,
    pub canvas: Option<CanvasConfig<T>>,
}

impl<T> Default for ViewConfigs<T> {
    fn default() -> Self {
        Self { table: None, grid: None, kanban: None, canvas: None }
    }
}

impl<T> ViewConfigs<T> {
    #[must_use]
    pub fn with_table(mut self, config: TableConfig<T>) -> Self {
        self.table = Some(config);
        self
    }

    #[must_use]
    pub fn with_grid(mut self, config: CardConfig<T>) -> Self {
        self.grid = Some(config);
        self
    }

    #[must_use]
    pub fn with_kanban(mut self, config: KanbanConfig<T>) -> Self {
        self.kanban = Some(config);
        self
    }

    #[must_use]
    pub fn with_canvas(mut self, config: CanvasConfig<T>) -> Self {
        self.canvas = Some(config);
        self
    }

    #[must_use]
    pub fn has(&self, view: ViewType) -> bool {
        match view {
            ViewType::Table => self.table.is_some(),
            ViewType::Grid => self.grid.is_some(),
            ViewType::Kanban => self.kanban.is_some(),
            ViewType::Canvas => self.canvas.is_some(),
        }
    }

    /// Configured views in canonical order.
    #[must_use]
    pub fn available(&self) -> Vec<ViewType> {
        ViewType::ALL.into_iter().filter(|view| self.has(*view)).collect()
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
