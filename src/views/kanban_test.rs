use std::sync::Mutex;

use super::*;
use crate::views::config::CardConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Idea {
    id: Uuid,
    title: String,
    stage: String,
}

impl RowId for Idea {
    fn row_id(&self) -> Uuid {
        self.id
    }
}

fn idea(title: &str, stage: &str) -> Idea {
    Idea { id: Uuid::new_v4(), title: title.into(), stage: stage.into() }
}

fn config() -> KanbanConfig<Idea> {
    KanbanConfig::new(
        vec![
            KanbanGroup::new("spark", "Spark", "#f59e0b"),
            KanbanGroup::new("explore", "Explore", "#3b82f6"),
            KanbanGroup::new("ship", "Ship", "#10b981"),
        ],
        |i: &Idea| i.stage.clone(),
        CardConfig::new(|i: &Idea| i.title.clone()),
    )
}

/// Records calls; succeeds by returning a moved copy, or rejects.
struct MockMover {
    calls: Mutex<Vec<(Uuid, String)>>,
    rows: Vec<Idea>,
    reject: bool,
}

impl MockMover {
    fn new(rows: &[Idea], reject: bool) -> Self {
        Self { calls: Mutex::new(Vec::new()), rows: rows.to_vec(), reject }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl MoveHandler<Idea> for MockMover {
    async fn move_item(&self, _rows: &[Idea], item_id: Uuid, to_group: &str) -> Result<Vec<Idea>, MoveError> {
        self.calls.lock().unwrap().push((item_id, to_group.to_owned()));
        if self.reject {
            return Err(MoveError("database unavailable".into()));
        }
        Ok(self
            .rows
            .iter()
            .cloned()
            .map(|mut r| {
                if r.id == item_id {
                    r.stage = to_group.to_owned();
                }
                r
            })
            .collect())
    }
}

// =========================================================================
// render
// =========================================================================

#[test]
fn render_partitions_items_by_group() {
    let rows = vec![idea("A", "spark"), idea("B", "ship"), idea("C", "spark")];
    let model = render(&config(), &rows).unwrap();
    assert_eq!(model.columns.len(), 3);
    assert_eq!(model.column("spark").unwrap().cards.len(), 2);
    assert!(model.column("explore").unwrap().cards.is_empty());
    assert_eq!(model.column("ship").unwrap().cards[0].title, "B");
    assert!(model.unassigned.is_empty());
}

#[test]
fn render_reports_items_with_unknown_group() {
    let rows = vec![idea("A", "parked")];
    let model = render(&config(), &rows).unwrap();
    assert_eq!(model.unassigned.len(), 1);
    assert!(model.columns.iter().all(|c| c.cards.is_empty()));
}

#[test]
fn render_without_groups_is_a_fault() {
    let config = KanbanConfig::new(vec![], |i: &Idea| i.stage.clone(), CardConfig::new(|i: &Idea| i.title.clone()));
    assert!(render(&config, &[]).is_err());
}

// =========================================================================
// resolve_target
// =========================================================================

#[test]
fn resolve_target_accepts_known_column() {
    let rows = vec![idea("A", "spark")];
    assert_eq!(resolve_target(&config(), &rows, &DropTarget::Column("ship".into())), Some("ship".into()));
    assert_eq!(resolve_target(&config(), &rows, &DropTarget::Column("nope".into())), None);
}

#[test]
fn resolve_target_inherits_group_from_item() {
    let rows = vec![idea("A", "spark"), idea("B", "explore")];
    let target = DropTarget::Item(rows[1].id);
    assert_eq!(resolve_target(&config(), &rows, &target), Some("explore".into()));
    assert_eq!(resolve_target(&config(), &rows, &DropTarget::Item(Uuid::new_v4())), None);
}

// =========================================================================
// drop_item
// =========================================================================

#[tokio::test]
async fn drop_on_same_group_never_calls_handler() {
    let rows = vec![idea("A", "spark"), idea("B", "spark")];
    let mover = MockMover::new(&rows, false);

    let by_column = drop_item(&config(), &rows, rows[0].id, &DropTarget::Column("spark".into()), &mover).await;
    let by_item = drop_item(&config(), &rows, rows[0].id, &DropTarget::Item(rows[1].id), &mover).await;

    assert_eq!(mover.call_count(), 0);
    assert!(matches!(by_column.status, MoveStatus::Noop { ref reason } if reason == "same_group"));
    assert!(matches!(by_item.status, MoveStatus::Noop { .. }));
    assert_eq!(by_column.items, rows);
}

#[tokio::test]
async fn drop_to_other_group_uses_handler_result() {
    let rows = vec![idea("A", "spark"), idea("B", "ship")];
    let mover = MockMover::new(&rows, false);

    let result = drop_item(&config(), &rows, rows[0].id, &DropTarget::Item(rows[1].id), &mover).await;

    assert_eq!(mover.call_count(), 1);
    assert_eq!(result.status, MoveStatus::Moved { from: "spark".into(), to: "ship".into() });
    assert_eq!(result.items[0].stage, "ship");
    assert_eq!(result.announcement.politeness, Politeness::Polite);
    assert!(result.announcement.message.contains("from Spark to Ship"));
    // Caller's rows untouched.
    assert_eq!(rows[0].stage, "spark");
}

#[tokio::test]
async fn rejected_move_keeps_original_grouping() {
    let rows = vec![idea("A", "spark"), idea("B", "explore")];
    let mover = MockMover::new(&rows, true);

    let result = drop_item(&config(), &rows, rows[0].id, &DropTarget::Column("explore".into()), &mover).await;

    assert_eq!(mover.call_count(), 1);
    let MoveStatus::Failed { ref toast, ref from, ref to } = result.status else {
        panic!("expected failure, got {:?}", result.status);
    };
    assert_eq!(from, "spark");
    assert_eq!(to, "explore");
    assert!(toast.contains("database unavailable"));
    assert_eq!(result.announcement.politeness, Politeness::Assertive);
    assert_eq!(result.items, rows);

    let model = render(&config(), &result.items).unwrap();
    assert_eq!(model.column("spark").unwrap().cards[0].id, rows[0].id);
}

#[tokio::test]
async fn drop_of_unknown_item_is_noop() {
    let rows = vec![idea("A", "spark")];
    let mover = MockMover::new(&rows, false);
    let result = drop_item(&config(), &rows, Uuid::new_v4(), &DropTarget::Column("ship".into()), &mover).await;
    assert_eq!(mover.call_count(), 0);
    assert!(matches!(result.status, MoveStatus::Noop { ref reason } if reason == "unknown_item"));
}

#[tokio::test]
async fn drop_on_unknown_column_is_noop() {
    let rows = vec![idea("A", "spark")];
    let mover = MockMover::new(&rows, false);
    let result = drop_item(&config(), &rows, rows[0].id, &DropTarget::Column("trash".into()), &mover).await;
    assert_eq!(mover.call_count(), 0);
    assert!(matches!(result.status, MoveStatus::Noop { ref reason } if reason == "unknown_target"));
}

/// Writes, then cannot reload; answers with the caller's rows patched.
struct UnreloadableMover;

#[async_trait::async_trait]
impl MoveHandler<Idea> for UnreloadableMover {
    async fn move_item(&self, rows: &[Idea], item_id: Uuid, to_group: &str) -> Result<Vec<Idea>, MoveError> {
        Ok(rows
            .iter()
            .cloned()
            .map(|mut r| {
                if r.id == item_id {
                    r.stage = to_group.to_owned();
                }
                r
            })
            .collect())
    }
}

#[tokio::test]
async fn persisted_move_without_reload_still_reports_moved() {
    let rows = vec![idea("A", "spark"), idea("B", "explore")];

    let result = drop_item(&config(), &rows, rows[0].id, &DropTarget::Column("ship".into()), &UnreloadableMover).await;

    assert_eq!(result.status, MoveStatus::Moved { from: "spark".into(), to: "ship".into() });
    assert_eq!(result.announcement.politeness, Politeness::Polite);
    let model = render(&config(), &result.items).unwrap();
    assert_eq!(model.column("ship").unwrap().cards[0].id, rows[0].id);
    assert!(model.column("spark").unwrap().cards.is_empty());
}

// =========================================================================
// announcements
// =========================================================================

#[test]
fn pickup_and_cancel_announcements_name_the_column() {
    let rows = vec![idea("Pricing page", "explore")];
    let pickup = announce_pickup(&config(), &rows, rows[0].id).unwrap();
    assert_eq!(pickup.message, "Picked up Pricing page. Current column: Explore.");
    let cancel = announce_cancel(&config(), &rows, rows[0].id).unwrap();
    assert_eq!(cancel.message, "Drop cancelled. Pricing page returned to Explore.");
    assert!(announce_pickup(&config(), &rows, Uuid::new_v4()).is_none());
}

#[test]
fn drop_target_serde_shape() {
    let target: DropTarget = serde_json::from_str(r#"{"column":"ship"}"#).unwrap();
    assert_eq!(target, DropTarget::Column("ship".into()));
}
