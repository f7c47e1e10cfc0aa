//! Canvas renderer: rows placed into named blocks of a canvas layout.

use serde::Serialize;

use super::boundary::RenderError;
use super::config::{CanvasConfig, Card, RowId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanvasBlock {
    pub key: String,
    pub label: String,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanvasModel {
    pub blocks: Vec<CanvasBlock>,
    /// Rows whose block is missing or not part of this layout.
    pub unplaced: Vec<Card>,
}

/// # Errors
///
/// Returns [`RenderError::Misconfigured`] when the layout declares no blocks.
pub fn render<T: RowId>(config: &CanvasConfig<T>, rows: &[T]) -> Result<CanvasModel, RenderError> {
    if config.blocks.is_empty() {
        return Err(RenderError::Misconfigured("canvas has no blocks".into()));
    }

    let mut blocks: Vec<CanvasBlock> = config
        .blocks
        .iter()
        .map(|b| CanvasBlock { key: b.key.clone(), label: b.label.clone(), cards: Vec::new() })
        .collect();
    let mut unplaced = Vec::new();

    for row in rows {
        let card = config.card.card(row);
        let slot = config
            .block_of(row)
            .and_then(|key| blocks.iter().position(|b| b.key == key));
        match slot {
            Some(idx) => blocks[idx].cards.push(card),
            None => unplaced.push(card),
        }
    }

    Ok(CanvasModel { blocks, unplaced })
}
