//! Table renderer: one row per item, one cell per configured column.

use serde::Serialize;
use uuid::Uuid;

use super::boundary::RenderError;
use super::config::{Align, RowId, TableConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableHeader {
    pub key: String,
    pub label: String,
    pub align: Align,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub id: Uuid,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableModel {
    pub headers: Vec<TableHeader>,
    pub rows: Vec<TableRow>,
}

/// Project `rows` through the configured columns.
///
/// # Errors
///
/// Returns [`RenderError::Misconfigured`] when no columns are configured.
pub fn render<T: RowId>(config: &TableConfig<T>, rows: &[T]) -> Result<TableModel, RenderError> {
    if config.columns.is_empty() {
        return Err(RenderError::Misconfigured("table has no columns".into()));
    }

    let headers = config
        .columns
        .iter()
        .map(|c| TableHeader { key: c.key.clone(), label: c.header.clone(), align: c.align })
        .collect();
    let rows = rows
        .iter()
        .map(|row| TableRow { id: row.row_id(), cells: config.columns.iter().map(|c| c.cell(row)).collect() })
        .collect();

    Ok(TableModel { headers, rows })
}
