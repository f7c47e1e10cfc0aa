//! Canvas block sync: replace a block's ordered membership rows.
//!
//! DESIGN
//! ======
//! A save sends every block's ordered id list. Each block is replaced on its
//! own (delete the block's rows, insert fresh ones numbered from 0) inside
//! its own transaction, and the sync keeps going when one block fails. The
//! caller gets a [`BatchResult`] naming which blocks were written and which
//! were not, so a partially applied save is visible instead of silent.
//!
//! Item placements and assumption links share this machinery through the
//! [`BlockStore`] trait; the only difference is the entry type each block
//! holds. A store can refuse entries the block does not accept (canvas
//! items of the wrong type), which fails that block without writing it.
//!
//! Each block write holds the block's [`InFlight::serialize`] lock, the
//! same one the linker takes, so a save never interleaves with a link.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::ContentError;
use super::assumption::ValidationStatus;
use super::canvas::{BlockDef, CanvasRef};
use super::canvas_item;
use super::guard::InFlight;

/// One entry in a block's ordered list.
pub trait BlockEntry: Clone + Send + Sync + 'static {
    fn entry_id(&self) -> Uuid;
    fn from_id(id: Uuid) -> Self;
}

impl BlockEntry for Uuid {
    fn entry_id(&self) -> Uuid {
        *self
    }

    fn from_id(id: Uuid) -> Self {
        id
    }
}

/// An assumption link with its optional per-canvas validation status.
///
/// A `None` status means the assumption's own status applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssumptionLinkEntry {
    pub id: Uuid,
    #[serde(default)]
    pub validation_status: Option<ValidationStatus>,
}

impl BlockEntry for AssumptionLinkEntry {
    fn entry_id(&self) -> Uuid {
        self.id
    }

    fn from_id(id: Uuid) -> Self {
        Self { id, validation_status: None }
    }
}

/// Persistence for one kind of block membership.
#[async_trait]
pub trait BlockStore: Send + Sync {
    type Entry: BlockEntry;

    async fn load_block(&self, canvas: CanvasRef, block: &str) -> Result<Vec<Self::Entry>, ContentError>;

    /// Replace every row for `(canvas, block)` with `entries` in order.
    async fn replace_block(&self, canvas: CanvasRef, block: &str, entries: &[Self::Entry])
    -> Result<(), ContentError>;

    /// Refuse entries `block` does not accept. Everything is accepted unless
    /// the store overrides this.
    async fn check_entries(&self, _block: &BlockDef, _entries: &[Self::Entry]) -> Result<(), String> {
        Ok(())
    }
}

/// Lock key shared by every writer of one block.
#[must_use]
pub fn block_lock_key(canvas: CanvasRef, block: &str) -> String {
    format!("block:{canvas}:{block}")
}

// =============================================================================
// BATCH RESULT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockFailure {
    pub key: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub succeeded: Vec<String>,
    pub failed: Vec<BlockFailure>,
}

impl BatchResult {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    #[must_use]
    pub fn failed_keys(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.key.as_str()).collect()
    }

    /// Banner text for a partially applied save.
    #[must_use]
    pub fn warning(&self) -> Option<String> {
        if self.failed.is_empty() {
            return None;
        }
        Some(format!("Some blocks were not saved: {}", self.failed_keys().join(", ")))
    }
}

// =============================================================================
// SYNC
// =============================================================================

/// Replace each block in `blocks`, continuing past failures.
///
/// Keys the canvas kind does not define, and blocks whose entries the store
/// refuses, are recorded as failures and never written. Duplicate ids
/// within a block keep their first position.
pub async fn sync_blocks<S>(
    store: &S,
    guards: &InFlight,
    canvas: CanvasRef,
    blocks: &BTreeMap<String, Vec<S::Entry>>,
) -> BatchResult
where
    S: BlockStore + ?Sized,
{
    let mut result = BatchResult::default();
    for (key, entries) in blocks {
        let Some(def) = canvas.kind.block(key) else {
            warn!(canvas = %canvas, block = %key, "sync skipped unknown block");
            result.failed.push(BlockFailure { key: key.clone(), error: format!("unknown block for {}", canvas.kind) });
            continue;
        };
        let entries = dedupe(entries);
        if let Err(error) = store.check_entries(def, &entries).await {
            warn!(canvas = %canvas, block = %key, %error, "sync refused block entries");
            result.failed.push(BlockFailure { key: key.clone(), error });
            continue;
        }
        let _block = guards.serialize(&block_lock_key(canvas, key)).await;
        match store.replace_block(canvas, key, &entries).await {
            Ok(()) => result.succeeded.push(key.clone()),
            Err(e) => {
                warn!(canvas = %canvas, block = %key, error = %e, "block sync failed");
                result.failed.push(BlockFailure { key: key.clone(), error: e.to_string() });
            }
        }
    }
    info!(
        canvas = %canvas,
        succeeded = result.succeeded.len(),
        failed = result.failed.len(),
        "block sync finished"
    );
    result
}

fn dedupe<E: BlockEntry>(entries: &[E]) -> Vec<E> {
    let mut seen = HashSet::new();
    entries.iter().filter(|e| seen.insert(e.entry_id())).cloned().collect()
}

// =============================================================================
// POSTGRES STORES
// =============================================================================

/// `canvas_item_placements`.
#[derive(Clone)]
pub struct PgPlacementStore {
    pool: PgPool,
}

impl PgPlacementStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlockStore for PgPlacementStore {
    type Entry = Uuid;

    async fn load_block(&self, canvas: CanvasRef, block: &str) -> Result<Vec<Uuid>, ContentError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT canvas_item_id FROM canvas_item_placements \
             WHERE canvas_id = $1 AND canvas_type = $2 AND block_key = $3 ORDER BY position",
        )
        .bind(canvas.id)
        .bind(canvas.kind.as_str())
        .bind(block)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn replace_block(&self, canvas: CanvasRef, block: &str, entries: &[Uuid]) -> Result<(), ContentError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM canvas_item_placements WHERE canvas_id = $1 AND canvas_type = $2 AND block_key = $3")
            .bind(canvas.id)
            .bind(canvas.kind.as_str())
            .bind(block)
            .execute(&mut *tx)
            .await?;
        for (position, item_id) in (0_i32..).zip(entries) {
            sqlx::query(
                "INSERT INTO canvas_item_placements (canvas_id, canvas_type, block_key, canvas_item_id, position) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(canvas.id)
            .bind(canvas.kind.as_str())
            .bind(block)
            .bind(item_id)
            .bind(position)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn check_entries(&self, block: &BlockDef, entries: &[Uuid]) -> Result<(), String> {
        let items = canvas_item::get_many(&self.pool, entries).await.map_err(|e| e.to_string())?;
        misplaced_items(block, &items)
    }
}

/// Canvas items whose type `block` does not accept.
///
/// # Errors
///
/// Names the first misplaced item.
pub fn misplaced_items(block: &BlockDef, items: &[canvas_item::CanvasItem]) -> Result<(), String> {
    match items.iter().find(|item| !block.allowed.contains(&item.item_type)) {
        Some(item) => Err(format!("{} \"{}\" is not allowed in {}", item.item_type, item.title, block.key)),
        None => Ok(()),
    }
}

/// `assumption_links`.
#[derive(Clone)]
pub struct PgAssumptionLinkStore {
    pool: PgPool,
}

impl PgAssumptionLinkStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlockStore for PgAssumptionLinkStore {
    type Entry = AssumptionLinkEntry;

    async fn load_block(&self, canvas: CanvasRef, block: &str) -> Result<Vec<AssumptionLinkEntry>, ContentError> {
        let rows = sqlx::query_as::<_, (Uuid, Option<String>)>(
            "SELECT assumption_id AS id, validation_status FROM assumption_links \
             WHERE canvas_id = $1 AND canvas_type = $2 AND block_key = $3 ORDER BY position",
        )
        .bind(canvas.id)
        .bind(canvas.kind.as_str())
        .bind(block)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, status)| AssumptionLinkEntry {
                id,
                validation_status: status.as_deref().and_then(ValidationStatus::from_str),
            })
            .collect())
    }

    async fn replace_block(
        &self,
        canvas: CanvasRef,
        block: &str,
        entries: &[AssumptionLinkEntry],
    ) -> Result<(), ContentError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM assumption_links WHERE canvas_id = $1 AND canvas_type = $2 AND block_key = $3")
            .bind(canvas.id)
            .bind(canvas.kind.as_str())
            .bind(block)
            .execute(&mut *tx)
            .await?;
        for (position, entry) in (0_i32..).zip(entries) {
            sqlx::query(
                "INSERT INTO assumption_links \
                 (canvas_id, canvas_type, block_key, assumption_id, position, validation_status) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(canvas.id)
            .bind(canvas.kind.as_str())
            .bind(block)
            .bind(entry.id)
            .bind(position)
            .bind(entry.validation_status.map(ValidationStatus::as_str))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "placement_test.rs"]
mod tests;
