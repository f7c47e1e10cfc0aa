//! Grid renderer: every row becomes a card.

use serde::Serialize;

use super::boundary::RenderError;
use super::config::{Card, CardConfig, RowId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridModel {
    pub cards: Vec<Card>,
}

/// # Errors
///
/// Infallible today; returns `Result` so the boundary treats every
/// renderer the same way.
pub fn render<T: RowId>(config: &CardConfig<T>, rows: &[T]) -> Result<GridModel, RenderError> {
    Ok(GridModel { cards: rows.iter().map(|row| config.card(row)).collect() })
}
