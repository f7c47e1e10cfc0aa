//! Canvases: business model canvases, value maps, and customer profiles.
//!
//! DESIGN
//! ======
//! The three kinds share one row shape and differ only in their table and
//! block layout, so they are handled by one module keyed on [`CanvasKind`].
//! Block membership lives in the join tables (`canvas_item_placements`,
//! `assumption_links`) and is written by the placement sync and the linker;
//! this module only reads it back as a [`CanvasLayout`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::assumption::{self, Assumption, ValidationStatus};
use super::canvas_item::{self, CanvasItem, ItemType};
use super::fields::{clean_opt, text_enum};
use super::{ContentError, expect_affected};
use crate::error::FieldErrors;
use crate::views::config::RowId;

const COLUMNS: &str = "id, name, description, \
    to_char(updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS updated_at";

text_enum! {
    CanvasKind {
        BusinessModel => "business_model",
        ValueMap => "value_map",
        CustomerProfile => "customer_profile",
    }
}

/// One block on a canvas and the item types it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockDef {
    pub key: &'static str,
    pub label: &'static str,
    pub allowed: &'static [ItemType],
}

const fn block(key: &'static str, label: &'static str, allowed: &'static [ItemType]) -> BlockDef {
    BlockDef { key, label, allowed }
}

const BUSINESS_MODEL_BLOCKS: &[BlockDef] = &[
    block("key_partners", "Key Partners", &[ItemType::Partner]),
    block("key_activities", "Key Activities", &[ItemType::Activity]),
    block("key_resources", "Key Resources", &[ItemType::Resource]),
    block("value_propositions", "Value Propositions", &[ItemType::ValueProposition]),
    block("customer_relationships", "Customer Relationships", &[ItemType::Relationship]),
    block("channels", "Channels", &[ItemType::Channel]),
    block("customer_segments", "Customer Segments", &[ItemType::Segment]),
    block("cost_structure", "Cost Structure", &[ItemType::Cost]),
    block("revenue_streams", "Revenue Streams", &[ItemType::Revenue]),
];

const VALUE_MAP_BLOCKS: &[BlockDef] = &[
    block("products_services", "Products & Services", &[ItemType::ProductService]),
    block("pain_relievers", "Pain Relievers", &[ItemType::PainReliever]),
    block("gain_creators", "Gain Creators", &[ItemType::GainCreator]),
];

const CUSTOMER_PROFILE_BLOCKS: &[BlockDef] = &[
    block("customer_jobs", "Customer Jobs", &[ItemType::Job]),
    block("pains", "Pains", &[ItemType::Pain]),
    block("gains", "Gains", &[ItemType::Gain]),
];

impl CanvasKind {
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::BusinessModel => "business_model_canvases",
            Self::ValueMap => "value_maps",
            Self::CustomerProfile => "customer_profiles",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::BusinessModel => "business model canvas",
            Self::ValueMap => "value map",
            Self::CustomerProfile => "customer profile",
        }
    }

    #[must_use]
    pub fn blocks(self) -> &'static [BlockDef] {
        match self {
            Self::BusinessModel => BUSINESS_MODEL_BLOCKS,
            Self::ValueMap => VALUE_MAP_BLOCKS,
            Self::CustomerProfile => CUSTOMER_PROFILE_BLOCKS,
        }
    }

    #[must_use]
    pub fn block(self, key: &str) -> Option<&'static BlockDef> {
        self.blocks().iter().find(|b| b.key == key)
    }

    /// The block that holds items of `item_type`, if this kind has one.
    #[must_use]
    pub fn block_for(self, item_type: ItemType) -> Option<&'static BlockDef> {
        self.blocks().iter().find(|b| b.allowed.contains(&item_type))
    }
}

/// A specific canvas: its kind plus row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CanvasRef {
    pub kind: CanvasKind,
    pub id: Uuid,
}

impl CanvasRef {
    #[must_use]
    pub fn new(kind: CanvasKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for CanvasRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Canvas {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub updated_at: String,
}

impl RowId for Canvas {
    fn row_id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasInput {
    pub name: String,
    pub description: Option<String>,
}

impl CanvasInput {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name);
        errors.into_result()
    }
}

// =============================================================================
// CRUD
// =============================================================================

/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list(pool: &PgPool, kind: CanvasKind) -> Result<Vec<Canvas>, ContentError> {
    let sql = format!("SELECT {COLUMNS} FROM {} ORDER BY updated_at DESC", kind.table());
    Ok(sqlx::query_as::<_, Canvas>(&sql).fetch_all(pool).await?)
}

/// # Errors
///
/// Returns `NotFound` if the canvas does not exist.
pub async fn get(pool: &PgPool, canvas: CanvasRef) -> Result<Canvas, ContentError> {
    let sql = format!("SELECT {COLUMNS} FROM {} WHERE id = $1", canvas.kind.table());
    sqlx::query_as::<_, Canvas>(&sql)
        .bind(canvas.id)
        .fetch_optional(pool)
        .await?
        .ok_or(ContentError::NotFound { entity: canvas.kind.label(), id: canvas.id })
}

/// # Errors
///
/// Returns validation errors or a database error.
pub async fn create(pool: &PgPool, kind: CanvasKind, input: &CanvasInput) -> Result<Canvas, ContentError> {
    input.validate()?;
    let id = Uuid::new_v4();
    let sql = format!(
        "INSERT INTO {} (id, name, description) VALUES ($1, $2, $3) RETURNING {COLUMNS}",
        kind.table()
    );
    let row = sqlx::query_as::<_, Canvas>(&sql)
        .bind(id)
        .bind(input.name.trim())
        .bind(clean_opt(input.description.as_deref()))
        .fetch_one(pool)
        .await?;
    info!(%id, kind = %kind, "canvas created");
    Ok(row)
}

/// # Errors
///
/// Returns validation errors, `NotFound`, or a database error.
pub async fn update(pool: &PgPool, canvas: CanvasRef, input: &CanvasInput) -> Result<Canvas, ContentError> {
    input.validate()?;
    let sql = format!(
        "UPDATE {} SET name = $2, description = $3, updated_at = now() WHERE id = $1 RETURNING {COLUMNS}",
        canvas.kind.table()
    );
    sqlx::query_as::<_, Canvas>(&sql)
        .bind(canvas.id)
        .bind(input.name.trim())
        .bind(clean_opt(input.description.as_deref()))
        .fetch_optional(pool)
        .await?
        .ok_or(ContentError::NotFound { entity: canvas.kind.label(), id: canvas.id })
}

/// Deletes the canvas together with its placements and assumption links.
///
/// # Errors
///
/// Returns `NotFound` or a database error.
pub async fn delete(pool: &PgPool, canvas: CanvasRef) -> Result<(), ContentError> {
    let mut tx = pool.begin().await?;
    for join in ["canvas_item_placements", "assumption_links"] {
        sqlx::query(&format!("DELETE FROM {join} WHERE canvas_id = $1 AND canvas_type = $2"))
            .bind(canvas.id)
            .bind(canvas.kind.as_str())
            .execute(&mut *tx)
            .await?;
    }
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", canvas.kind.table()))
        .bind(canvas.id)
        .execute(&mut *tx)
        .await?;
    expect_affected(&result, canvas.kind.label(), canvas.id)?;
    tx.commit().await?;
    info!(canvas = %canvas, "canvas deleted");
    Ok(())
}

// =============================================================================
// LAYOUT
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LinkedAssumption {
    #[serde(flatten)]
    pub assumption: Assumption,
    /// Status recorded on this link, overriding the assumption's own status.
    pub link_status: Option<ValidationStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutBlock {
    pub key: &'static str,
    pub label: &'static str,
    pub allowed: &'static [ItemType],
    pub items: Vec<CanvasItem>,
    pub assumptions: Vec<LinkedAssumption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CanvasLayout {
    pub kind: CanvasKind,
    pub canvas: Canvas,
    pub blocks: Vec<LayoutBlock>,
}

#[derive(sqlx::FromRow)]
struct PlacementRow {
    block_key: String,
    target_id: Uuid,
    link_status: Option<String>,
}

/// The canvas with every block's items and assumptions in saved order.
///
/// Rows under block keys the kind no longer defines are ignored.
///
/// # Errors
///
/// Returns `NotFound` if the canvas does not exist, or a database error.
pub async fn layout(pool: &PgPool, canvas: CanvasRef) -> Result<CanvasLayout, ContentError> {
    let row = get(pool, canvas).await?;

    let placements = sqlx::query_as::<_, PlacementRow>(
        "SELECT block_key, canvas_item_id AS target_id, NULL::text AS link_status \
         FROM canvas_item_placements WHERE canvas_id = $1 AND canvas_type = $2 ORDER BY block_key, position",
    )
    .bind(canvas.id)
    .bind(canvas.kind.as_str())
    .fetch_all(pool)
    .await?;

    let links = sqlx::query_as::<_, PlacementRow>(
        "SELECT block_key, assumption_id AS target_id, validation_status AS link_status \
         FROM assumption_links WHERE canvas_id = $1 AND canvas_type = $2 ORDER BY block_key, position",
    )
    .bind(canvas.id)
    .bind(canvas.kind.as_str())
    .fetch_all(pool)
    .await?;

    let item_ids: Vec<Uuid> = placements.iter().map(|p| p.target_id).collect();
    let assumption_ids: Vec<Uuid> = links.iter().map(|l| l.target_id).collect();
    let (items, assumptions) = tokio::try_join!(
        canvas_item::get_many(pool, &item_ids),
        assumption::get_many(pool, &assumption_ids),
    )?;

    let items: HashMap<Uuid, CanvasItem> = items.into_iter().map(|i| (i.id, i)).collect();
    let assumptions: HashMap<Uuid, Assumption> = assumptions.into_iter().map(|a| (a.id, a)).collect();

    let blocks = canvas
        .kind
        .blocks()
        .iter()
        .map(|def| LayoutBlock {
            key: def.key,
            label: def.label,
            allowed: def.allowed,
            items: placements
                .iter()
                .filter(|p| p.block_key == def.key)
                .filter_map(|p| items.get(&p.target_id).cloned())
                .collect(),
            assumptions: links
                .iter()
                .filter(|l| l.block_key == def.key)
                .filter_map(|l| {
                    assumptions.get(&l.target_id).map(|a| LinkedAssumption {
                        assumption: a.clone(),
                        link_status: l.link_status.as_deref().and_then(ValidationStatus::from_str),
                    })
                })
                .collect(),
        })
        .collect();

    Ok(CanvasLayout { kind: canvas.kind, canvas: row, blocks })
}

#[cfg(test)]
#[path = "canvas_test.rs"]
mod tests;
