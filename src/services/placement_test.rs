use std::collections::HashMap;
use std::sync::Mutex;

use super::*;
use crate::services::canvas::CanvasKind;
use crate::services::canvas_item::{CanvasItem, ItemType};

/// In-memory store that fails writes for the listed blocks and refuses
/// the listed ids.
#[derive(Default)]
struct MockStore {
    fail: Vec<&'static str>,
    refuse: Vec<Uuid>,
    rows: Mutex<HashMap<String, Vec<Uuid>>>,
    writes: Mutex<Vec<String>>,
}

impl MockStore {
    fn failing(fail: Vec<&'static str>) -> Self {
        Self { fail, ..Self::default() }
    }

    fn rows(&self, block: &str) -> Vec<Uuid> {
        self.rows.lock().unwrap().get(block).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl BlockStore for MockStore {
    type Entry = Uuid;

    async fn load_block(&self, _canvas: CanvasRef, block: &str) -> Result<Vec<Uuid>, ContentError> {
        Ok(self.rows(block))
    }

    async fn replace_block(&self, _canvas: CanvasRef, block: &str, entries: &[Uuid]) -> Result<(), ContentError> {
        self.writes.lock().unwrap().push(block.to_string());
        if self.fail.iter().any(|f| *f == block) {
            return Err(ContentError::Conflict(format!("{block} is locked")));
        }
        self.rows.lock().unwrap().insert(block.to_string(), entries.to_vec());
        Ok(())
    }

    async fn check_entries(&self, block: &BlockDef, entries: &[Uuid]) -> Result<(), String> {
        match entries.iter().find(|id| self.refuse.contains(id)) {
            Some(id) => Err(format!("{id} is not allowed in {}", block.key)),
            None => Ok(()),
        }
    }
}

fn bmc() -> CanvasRef {
    CanvasRef::new(CanvasKind::BusinessModel, Uuid::new_v4())
}

fn ids(n: usize) -> Vec<Uuid> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

#[tokio::test]
async fn all_blocks_succeed() {
    let store = MockStore::default();
    let channels = ids(2);
    let blocks = BTreeMap::from([("channels".to_string(), channels.clone()), ("key_partners".to_string(), ids(1))]);

    let result = sync_blocks(&store, &InFlight::new(), bmc(), &blocks).await;

    assert!(result.is_complete());
    assert_eq!(result.succeeded, vec!["channels".to_string(), "key_partners".to_string()]);
    assert_eq!(result.warning(), None);
    assert_eq!(store.rows("channels"), channels);
}

#[tokio::test]
async fn one_failing_block_does_not_stop_the_rest() {
    let store = MockStore::failing(vec!["customer_segments"]);
    let keys = ["channels", "customer_segments", "key_partners", "revenue_streams"];
    let blocks: BTreeMap<String, Vec<Uuid>> = keys.iter().map(|k| ((*k).to_string(), ids(2))).collect();

    let result = sync_blocks(&store, &InFlight::new(), bmc(), &blocks).await;

    assert_eq!(result.succeeded.len(), keys.len() - 1);
    assert_eq!(result.failed_keys(), vec!["customer_segments"]);
    assert!(result.failed[0].error.contains("locked"));
    assert_eq!(store.writes.lock().unwrap().len(), keys.len(), "every block attempted");
    assert_eq!(result.warning().unwrap(), "Some blocks were not saved: customer_segments");
    assert!(store.rows("customer_segments").is_empty());
    assert_eq!(store.rows("revenue_streams").len(), 2);
}

#[tokio::test]
async fn unknown_block_is_reported_without_touching_store() {
    let store = MockStore::default();
    let blocks = BTreeMap::from([("pains".to_string(), ids(1)), ("channels".to_string(), ids(1))]);

    let result = sync_blocks(&store, &InFlight::new(), bmc(), &blocks).await;

    assert_eq!(result.succeeded, vec!["channels".to_string()]);
    assert_eq!(result.failed_keys(), vec!["pains"]);
    assert_eq!(*store.writes.lock().unwrap(), vec!["channels".to_string()]);
}

#[tokio::test]
async fn duplicate_ids_keep_first_position() {
    let store = MockStore::default();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let blocks = BTreeMap::from([("channels".to_string(), vec![a, b, a])]);

    sync_blocks(&store, &InFlight::new(), bmc(), &blocks).await;

    assert_eq!(store.rows("channels"), vec![a, b]);
}

#[tokio::test]
async fn empty_list_clears_block() {
    let store = MockStore::default();
    store.rows.lock().unwrap().insert("channels".to_string(), ids(3));
    let blocks = BTreeMap::from([("channels".to_string(), Vec::new())]);

    let result = sync_blocks(&store, &InFlight::new(), bmc(), &blocks).await;

    assert!(result.is_complete());
    assert!(store.rows("channels").is_empty());
}

#[tokio::test]
async fn refused_entries_fail_their_block_only() {
    let wrong = Uuid::new_v4();
    let store = MockStore { refuse: vec![wrong], ..MockStore::default() };
    store.rows.lock().unwrap().insert("customer_segments".to_string(), ids(1));
    let blocks = BTreeMap::from([
        ("customer_segments".to_string(), vec![Uuid::new_v4(), wrong]),
        ("channels".to_string(), Vec::new()),
    ]);

    let result = sync_blocks(&store, &InFlight::new(), bmc(), &blocks).await;

    assert_eq!(result.succeeded, vec!["channels".to_string()]);
    assert_eq!(result.failed_keys(), vec!["customer_segments"]);
    assert!(result.failed[0].error.contains("customer_segments"));
    assert_eq!(store.rows("customer_segments").len(), 1, "refused block left as it was");
}

fn item(title: &str, item_type: ItemType) -> CanvasItem {
    CanvasItem {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: None,
        item_type,
        tags: Vec::new(),
        updated_at: "2024-03-18T10:00:00Z".to_string(),
    }
}

#[test]
fn misplaced_items_names_the_wrong_type() {
    let segments = CanvasKind::BusinessModel.block("customer_segments").unwrap();

    assert!(misplaced_items(segments, &[item("SMB owners", ItemType::Segment)]).is_ok());

    let err = misplaced_items(segments, &[item("SMB owners", ItemType::Segment), item("Podcast", ItemType::Channel)])
        .unwrap_err();
    assert!(err.contains("Podcast"), "{err}");
    assert!(err.contains("customer_segments"), "{err}");
}

#[test]
fn assumption_link_entry_accepts_optional_status() {
    let entry: AssumptionLinkEntry =
        serde_json::from_str(&format!(r#"{{"id":"{}","validation_status":"testing"}}"#, Uuid::nil())).unwrap();
    assert_eq!(entry.validation_status, Some(ValidationStatus::Testing));
    let bare: AssumptionLinkEntry = serde_json::from_str(&format!(r#"{{"id":"{}"}}"#, Uuid::nil())).unwrap();
    assert_eq!(bare, AssumptionLinkEntry::from_id(Uuid::nil()));
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn pg_placement_store_replaces_block_rows() {
    use crate::services::canvas_item::{self, CanvasItemInput, ItemType};

    let pool = crate::state::test_helpers::integration_pool().await;
    let store = PgPlacementStore::new(pool.clone());
    let a = canvas_item::create(&pool, &CanvasItemInput::new("Newsletter", ItemType::Channel)).await.unwrap();
    let b = canvas_item::create(&pool, &CanvasItemInput::new("Podcast", ItemType::Channel)).await.unwrap();
    let canvas = bmc();

    store.replace_block(canvas, "channels", &[a.id, b.id]).await.unwrap();
    store.replace_block(canvas, "channels", &[b.id, a.id]).await.unwrap();

    assert_eq!(store.load_block(canvas, "channels").await.unwrap(), vec![b.id, a.id]);
}
