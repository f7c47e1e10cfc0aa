//! Link canvas items or assumptions into a canvas block.
//!
//! DESIGN
//! ======
//! One [`Linker`] serves both canvas items and assumptions. It reads and
//! writes the block's ordered list through a [`BlockStore`] and finds or
//! creates link targets through [`LinkTargets`]. With `validation` on it
//! also checks drafts and refuses duplicate links; with it off only the
//! block's allowed-type filter is enforced.
//!
//! Creating, linking, and unlinking hold an [`InFlight`] key for their
//! scope, so a double-submitted request fails with `Busy` instead of racing.
//! Every rewrite of a block's list also runs under that block's serialize
//! lock, so concurrent links of different records are applied one after the
//! other and none is lost. New records are only created on an explicit
//! submit, then appended.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::ContentError;
use super::assumption::{self, AssumptionInput, Category};
use super::canvas::CanvasRef;
use super::canvas_item::{self, CanvasItemInput, ItemType};
use super::guard::InFlight;
use super::placement::{BlockEntry, BlockStore, block_lock_key};
use crate::error::{ErrorCode, FieldErrors};

const SEARCH_LIMIT: i64 = 20;

/// A record that can be linked into a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub id: Uuid,
    pub title: String,
    /// Item type for canvas items, category for assumptions.
    pub kind: String,
}

/// Fields for a record created from the linker popover.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Draft {
    pub title: String,
    pub kind: String,
    pub description: Option<String>,
}

/// The block being edited and the target kinds it accepts.
#[derive(Debug, Clone)]
pub struct BlockScope {
    pub canvas: CanvasRef,
    pub block: String,
    pub allowed: Vec<String>,
}

impl BlockScope {
    #[must_use]
    pub fn new(canvas: CanvasRef, block: impl Into<String>, allowed: Vec<String>) -> Self {
        Self { canvas, block: block.into(), allowed }
    }

    fn allows(&self, kind: &str) -> bool {
        self.allowed.iter().any(|k| k == kind)
    }

    fn guard_key(&self, op: &str) -> String {
        format!("{op}:{}:{}", self.canvas, self.block)
    }

    fn block_key(&self) -> String {
        block_lock_key(self.canvas, &self.block)
    }
}

impl fmt::Display for BlockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.canvas, self.block)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LinkerError {
    #[error("already in progress: {0}")]
    Busy(String),
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("already linked: {0}")]
    Duplicate(Uuid),
    #[error("{kind} is not allowed in {block}")]
    NotAllowed { kind: String, block: String },
    #[error("link target not found: {0}")]
    TargetNotFound(Uuid),
    #[error(transparent)]
    Content(#[from] ContentError),
}

impl ErrorCode for LinkerError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Busy(_) => "E_BUSY",
            Self::Validation(_) => "E_VALIDATION",
            Self::Duplicate(_) => "E_DUPLICATE_LINK",
            Self::NotAllowed { .. } => "E_TYPE_NOT_ALLOWED",
            Self::TargetNotFound(_) => "E_NOT_FOUND",
            Self::Content(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Busy(_) => true,
            Self::Content(e) => e.retryable(),
            _ => false,
        }
    }
}

/// Lookup and creation of link targets.
#[async_trait]
pub trait LinkTargets: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Candidate>, ContentError>;

    /// Candidates for `ids`, in order; unknown ids are skipped.
    async fn resolve(&self, ids: &[Uuid]) -> Result<Vec<Candidate>, ContentError>;

    async fn search(&self, query: &str, allowed: &[String], exclude: &[Uuid]) -> Result<Vec<Candidate>, ContentError>;

    async fn create(&self, draft: &Draft) -> Result<Candidate, ContentError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOutcome {
    pub created: Candidate,
    pub linked: Vec<Candidate>,
}

// =============================================================================
// LINKER
// =============================================================================

pub struct Linker<E: BlockEntry> {
    blocks: Arc<dyn BlockStore<Entry = E>>,
    targets: Arc<dyn LinkTargets>,
    guards: InFlight,
    validation: bool,
}

impl<E: BlockEntry> Linker<E> {
    #[must_use]
    pub fn new(
        blocks: Arc<dyn BlockStore<Entry = E>>,
        targets: Arc<dyn LinkTargets>,
        guards: InFlight,
        validation: bool,
    ) -> Self {
        Self { blocks, targets, guards, validation }
    }

    #[must_use]
    pub fn validates(&self) -> bool {
        self.validation
    }

    /// Currently linked records in block order.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn linked(&self, scope: &BlockScope) -> Result<Vec<Candidate>, LinkerError> {
        let entries = self.blocks.load_block(scope.canvas, &scope.block).await?;
        self.resolve(&entries).await
    }

    /// Case-insensitive search over allowed kinds, skipping records already linked.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn search(&self, scope: &BlockScope, query: &str) -> Result<Vec<Candidate>, LinkerError> {
        let entries = self.blocks.load_block(scope.canvas, &scope.block).await?;
        let exclude: Vec<Uuid> = entries.iter().map(BlockEntry::entry_id).collect();
        Ok(self.targets.search(query, &scope.allowed, &exclude).await?)
    }

    /// Create a record from `draft` and append it to the block.
    ///
    /// # Errors
    ///
    /// `Busy` while another create for the block runs, `Validation` or
    /// `NotAllowed` for a rejected draft, or a store error.
    pub async fn create_and_link(&self, scope: &BlockScope, draft: &Draft) -> Result<CreateOutcome, LinkerError> {
        let key = scope.guard_key("creating");
        let _token = self.guards.try_acquire(key.clone()).ok_or(LinkerError::Busy(key))?;

        if self.validation {
            let mut errors = FieldErrors::new();
            errors.require("title", &draft.title);
            if !scope.allows(&draft.kind) {
                errors.add("kind", "is not allowed in this block");
            }
            errors.into_result().map_err(LinkerError::Validation)?;
        } else if !scope.allows(&draft.kind) {
            return Err(LinkerError::NotAllowed { kind: draft.kind.clone(), block: scope.block.clone() });
        }

        let created = self.targets.create(draft).await?;
        let _block = self.guards.serialize(&scope.block_key()).await;
        let mut entries = self.blocks.load_block(scope.canvas, &scope.block).await?;
        entries.push(E::from_id(created.id));
        if let Err(e) = self.blocks.replace_block(scope.canvas, &scope.block, &entries).await {
            warn!(scope = %scope, id = %created.id, error = %e, "created record could not be linked");
            return Err(e.into());
        }
        info!(scope = %scope, id = %created.id, "created and linked");
        let linked = self.resolve(&entries).await?;
        Ok(CreateOutcome { created, linked })
    }

    /// Append an existing record to the block.
    ///
    /// Linking an already linked record is a `Duplicate` error with
    /// validation on and a no-op without it.
    ///
    /// # Errors
    ///
    /// `Busy`, `Duplicate`, `TargetNotFound`, `NotAllowed`, or a store error.
    pub async fn link(&self, scope: &BlockScope, id: Uuid) -> Result<Vec<Candidate>, LinkerError> {
        let key = format!("{}:{id}", scope.guard_key("linking"));
        let _token = self.guards.try_acquire(key.clone()).ok_or(LinkerError::Busy(key))?;
        let _block = self.guards.serialize(&scope.block_key()).await;

        let mut entries = self.blocks.load_block(scope.canvas, &scope.block).await?;
        if entries.iter().any(|e| e.entry_id() == id) {
            if self.validation {
                return Err(LinkerError::Duplicate(id));
            }
            return self.resolve(&entries).await;
        }

        let target = self.targets.get(id).await?.ok_or(LinkerError::TargetNotFound(id))?;
        if !scope.allows(&target.kind) {
            return Err(LinkerError::NotAllowed { kind: target.kind, block: scope.block.clone() });
        }

        entries.push(E::from_id(id));
        self.blocks.replace_block(scope.canvas, &scope.block, &entries).await?;
        info!(scope = %scope, %id, "linked");
        self.resolve(&entries).await
    }

    /// Remove a record from the block; the record itself is kept.
    ///
    /// # Errors
    ///
    /// `Busy` or a store error.
    pub async fn unlink(&self, scope: &BlockScope, id: Uuid) -> Result<Vec<Candidate>, LinkerError> {
        let key = format!("{}:{id}", scope.guard_key("unlinking"));
        let _token = self.guards.try_acquire(key.clone()).ok_or(LinkerError::Busy(key))?;
        let _block = self.guards.serialize(&scope.block_key()).await;

        let mut entries = self.blocks.load_block(scope.canvas, &scope.block).await?;
        let before = entries.len();
        entries.retain(|e| e.entry_id() != id);
        if entries.len() != before {
            self.blocks.replace_block(scope.canvas, &scope.block, &entries).await?;
            info!(scope = %scope, %id, "unlinked");
        }
        self.resolve(&entries).await
    }

    async fn resolve(&self, entries: &[E]) -> Result<Vec<Candidate>, LinkerError> {
        let ids: Vec<Uuid> = entries.iter().map(BlockEntry::entry_id).collect();
        Ok(self.targets.resolve(&ids).await?)
    }
}

// =============================================================================
// POSTGRES TARGETS
// =============================================================================

fn parse_kinds<T>(allowed: &[String], parse: impl Fn(&str) -> Option<T>) -> Vec<T> {
    allowed.iter().filter_map(|k| parse(k)).collect()
}

/// Canvas items as link targets.
#[derive(Clone)]
pub struct CanvasItemTargets {
    pool: PgPool,
}

impl CanvasItemTargets {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn item_candidate(item: canvas_item::CanvasItem) -> Candidate {
    Candidate { id: item.id, title: item.title, kind: item.item_type.as_str().to_owned() }
}

#[async_trait]
impl LinkTargets for CanvasItemTargets {
    async fn get(&self, id: Uuid) -> Result<Option<Candidate>, ContentError> {
        match canvas_item::get(&self.pool, id).await {
            Ok(item) => Ok(Some(item_candidate(item))),
            Err(ContentError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn resolve(&self, ids: &[Uuid]) -> Result<Vec<Candidate>, ContentError> {
        Ok(canvas_item::get_many(&self.pool, ids).await?.into_iter().map(item_candidate).collect())
    }

    async fn search(&self, query: &str, allowed: &[String], exclude: &[Uuid]) -> Result<Vec<Candidate>, ContentError> {
        let types = parse_kinds(allowed, ItemType::from_str);
        let items = canvas_item::search(&self.pool, query, &types, exclude, SEARCH_LIMIT).await?;
        Ok(items.into_iter().map(item_candidate).collect())
    }

    async fn create(&self, draft: &Draft) -> Result<Candidate, ContentError> {
        let Some(item_type) = ItemType::from_str(&draft.kind) else {
            let mut errors = FieldErrors::new();
            errors.add("kind", "is not a known item type");
            return Err(errors.into());
        };
        let mut input = CanvasItemInput::new(draft.title.clone(), item_type);
        input.description.clone_from(&draft.description);
        Ok(item_candidate(canvas_item::create(&self.pool, &input).await?))
    }
}

/// Assumptions as link targets; `kind` is the assumption category.
#[derive(Clone)]
pub struct AssumptionTargets {
    pool: PgPool,
}

impl AssumptionTargets {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn assumption_candidate(row: assumption::Assumption) -> Candidate {
    Candidate { id: row.id, title: row.statement, kind: row.category.as_str().to_owned() }
}

#[async_trait]
impl LinkTargets for AssumptionTargets {
    async fn get(&self, id: Uuid) -> Result<Option<Candidate>, ContentError> {
        match assumption::get(&self.pool, id).await {
            Ok(row) => Ok(Some(assumption_candidate(row))),
            Err(ContentError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn resolve(&self, ids: &[Uuid]) -> Result<Vec<Candidate>, ContentError> {
        Ok(assumption::get_many(&self.pool, ids).await?.into_iter().map(assumption_candidate).collect())
    }

    async fn search(&self, query: &str, allowed: &[String], exclude: &[Uuid]) -> Result<Vec<Candidate>, ContentError> {
        let categories = parse_kinds(allowed, Category::from_str);
        let rows = assumption::search(&self.pool, query, &categories, exclude, SEARCH_LIMIT).await?;
        Ok(rows.into_iter().map(assumption_candidate).collect())
    }

    async fn create(&self, draft: &Draft) -> Result<Candidate, ContentError> {
        let mut input = AssumptionInput::new(draft.title.clone());
        input.category = Category::from_str(&draft.kind);
        input.notes.clone_from(&draft.description);
        Ok(assumption_candidate(assumption::create(&self.pool, &input).await?))
    }
}

/// Allowed kinds for the canvas item linker on a block.
#[must_use]
pub fn item_kinds(allowed: &[ItemType]) -> Vec<String> {
    allowed.iter().map(|t| t.as_str().to_owned()).collect()
}

/// Every assumption category; assumptions may be linked into any block.
#[must_use]
pub fn assumption_kinds() -> Vec<String> {
    Category::ALL.iter().map(|c| c.as_str().to_owned()).collect()
}

#[cfg(test)]
#[path = "linker_test.rs"]
mod tests;
