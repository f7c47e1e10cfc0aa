//! Kanban renderer and drag/drop move resolution.
//!
//! DESIGN
//! ======
//! Columns are caller-defined groups; items are partitioned by the config's
//! key function. A drop names either a column or another item (whose column
//! is inherited). The board never mutates the caller's rows: the injected
//! [`MoveHandler`] returns the authoritative post-move list, and on failure
//! the caller's original list is handed back unchanged so the next render
//! shows the item where the data says it is. A handler whose write landed
//! but whose reload failed must still answer `Ok`, with the caller's rows
//! patched to the new group, so a persisted move is never shown as rejected.
//!
//! Every pickup, drop, failure and cancel produces an [`Announcement`] for
//! the page's live region.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::boundary::RenderError;
use super::config::{Card, KanbanConfig, KanbanGroup, RowId};

// =============================================================================
// MODEL
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KanbanColumn {
    #[serde(flatten)]
    pub group: KanbanGroup,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KanbanModel {
    pub columns: Vec<KanbanColumn>,
    /// Rows whose key matched no configured group.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unassigned: Vec<Card>,
}

impl KanbanModel {
    #[must_use]
    pub fn column(&self, id: &str) -> Option<&KanbanColumn> {
        self.columns.iter().find(|c| c.group.id == id)
    }
}

/// Partition `rows` into the configured columns.
///
/// # Errors
///
/// Returns [`RenderError::Misconfigured`] when no groups are configured.
pub fn render<T: RowId>(config: &KanbanConfig<T>, rows: &[T]) -> Result<KanbanModel, RenderError> {
    if config.groups.is_empty() {
        return Err(RenderError::Misconfigured("kanban has no groups".into()));
    }

    let mut columns: Vec<KanbanColumn> = config
        .groups
        .iter()
        .map(|g| KanbanColumn { group: g.clone(), cards: Vec::new() })
        .collect();
    let mut unassigned = Vec::new();

    for row in rows {
        let key = config.group_of(row);
        let card = config.card.card(row);
        match columns.iter().position(|c| c.group.id == key) {
            Some(idx) => columns[idx].cards.push(card),
            None => {
                warn!(item_id = %card.id, group = %key, "kanban item has no matching group");
                unassigned.push(card);
            }
        }
    }

    Ok(KanbanModel { columns, unassigned })
}

// =============================================================================
// DRAG AND DROP
// =============================================================================

/// Where an item was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropTarget {
    Column(String),
    Item(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Politeness {
    Polite,
    Assertive,
}

/// Live-region message describing a drag/drop step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Announcement {
    pub politeness: Politeness,
    pub message: String,
}

impl Announcement {
    fn polite(message: String) -> Self {
        Self { politeness: Politeness::Polite, message }
    }

    fn assertive(message: String) -> Self {
        Self { politeness: Politeness::Assertive, message }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MoveError(pub String);

/// Persists a column change and returns the authoritative row list.
///
/// `rows` is the list the drop was made on. `Err` means nothing was written.
#[async_trait::async_trait]
pub trait MoveHandler<T>: Send + Sync {
    async fn move_item(&self, rows: &[T], item_id: Uuid, to_group: &str) -> Result<Vec<T>, MoveError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MoveStatus {
    /// Nothing to do: unknown item/target or same column.
    Noop { reason: String },
    Moved { from: String, to: String },
    Failed { from: String, to: String, toast: String },
}

/// Result of a drop: what happened, what to announce, and the rows the
/// board should render next.
#[derive(Debug, Clone)]
pub struct DropResult<T> {
    pub status: MoveStatus,
    pub announcement: Announcement,
    pub items: Vec<T>,
}

/// Resolve the group id a drop lands in.
pub fn resolve_target<T: RowId>(config: &KanbanConfig<T>, rows: &[T], target: &DropTarget) -> Option<String> {
    let group = match target {
        DropTarget::Column(id) => id.clone(),
        DropTarget::Item(id) => config.group_of(rows.iter().find(|r| r.row_id() == *id)?),
    };
    config.groups.iter().any(|g| g.id == group).then_some(group)
}

/// Announcement when a card is picked up.
pub fn announce_pickup<T: RowId>(config: &KanbanConfig<T>, rows: &[T], item_id: Uuid) -> Option<Announcement> {
    let row = rows.iter().find(|r| r.row_id() == item_id)?;
    let title = config.card.card(row).title;
    let column = group_label(config, &config.group_of(row));
    Some(Announcement::polite(format!("Picked up {title}. Current column: {column}.")))
}

/// Announcement when a drag is cancelled.
pub fn announce_cancel<T: RowId>(config: &KanbanConfig<T>, rows: &[T], item_id: Uuid) -> Option<Announcement> {
    let row = rows.iter().find(|r| r.row_id() == item_id)?;
    let title = config.card.card(row).title;
    let column = group_label(config, &config.group_of(row));
    Some(Announcement::polite(format!("Drop cancelled. {title} returned to {column}.")))
}

/// Handle a drop of `item_id` onto `target`.
///
/// Same-column drops and unresolvable targets never reach the handler.
pub async fn drop_item<T, H>(
    config: &KanbanConfig<T>,
    rows: &[T],
    item_id: Uuid,
    target: &DropTarget,
    handler: &H,
) -> DropResult<T>
where
    T: RowId + Clone + Send + Sync,
    H: MoveHandler<T> + ?Sized,
{
    let noop = |reason: &str, message: String| DropResult {
        status: MoveStatus::Noop { reason: reason.to_owned() },
        announcement: Announcement::polite(message),
        items: rows.to_vec(),
    };

    let Some(row) = rows.iter().find(|r| r.row_id() == item_id) else {
        return noop("unknown_item", "Nothing was moved.".to_owned());
    };
    let title = config.card.card(row).title;
    let from = config.group_of(row);

    let Some(to) = resolve_target(config, rows, target) else {
        return noop("unknown_target", format!("{title} was not dropped on a column."));
    };
    if to == from {
        debug!(%item_id, group = %to, "kanban drop onto same column ignored");
        return noop("same_group", format!("{title} stays in {}.", group_label(config, &to)));
    }

    match handler.move_item(rows, item_id, &to).await {
        Ok(items) => DropResult {
            announcement: Announcement::polite(format!(
                "Moved {title} from {} to {}.",
                group_label(config, &from),
                group_label(config, &to)
            )),
            status: MoveStatus::Moved { from, to },
            items,
        },
        Err(err) => {
            warn!(%item_id, %from, %to, error = %err, "kanban move rejected");
            let toast = format!("Could not move {title}: {err}");
            DropResult {
                announcement: Announcement::assertive(format!(
                    "Could not move {title} to {}. It stays in {}.",
                    group_label(config, &to),
                    group_label(config, &from)
                )),
                status: MoveStatus::Failed { from, to, toast },
                items: rows.to_vec(),
            }
        }
    }
}

fn group_label<T>(config: &KanbanConfig<T>, id: &str) -> String {
    config
        .groups
        .iter()
        .find(|g| g.id == id)
        .map_or_else(|| id.to_owned(), |g| g.label.clone())
}

#[cfg(test)]
#[path = "kanban_test.rs"]
mod tests;
