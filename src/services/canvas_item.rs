//! Reusable canvas items (partners, channels, pains, ...).
//!
//! Items live independently of any canvas and are placed into canvas blocks
//! through `canvas_item_placements`, so one item can appear on several
//! canvases.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::fields::{clean_opt, clean_tags, text_enum};
use super::{ContentError, expect_affected};
use crate::error::FieldErrors;
use crate::views::config::RowId;

const ENTITY: &str = "canvas item";

const COLUMNS: &str = "id, title, description, item_type, tags, \
    to_char(updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS updated_at";

text_enum! {
    /// What a canvas item represents. Each canvas block accepts a subset.
    ItemType {
        Partner => "partner",
        Activity => "activity",
        Resource => "resource",
        ValueProposition => "value_proposition",
        Relationship => "relationship",
        Channel => "channel",
        Segment => "segment",
        Cost => "cost",
        Revenue => "revenue",
        Job => "job",
        Pain => "pain",
        Gain => "gain",
        ProductService => "product_service",
        PainReliever => "pain_reliever",
        GainCreator => "gain_creator",
    }
}

impl ItemType {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Partner => "Partner",
            Self::Activity => "Activity",
            Self::Resource => "Resource",
            Self::ValueProposition => "Value proposition",
            Self::Relationship => "Relationship",
            Self::Channel => "Channel",
            Self::Segment => "Customer segment",
            Self::Cost => "Cost",
            Self::Revenue => "Revenue stream",
            Self::Job => "Customer job",
            Self::Pain => "Pain",
            Self::Gain => "Gain",
            Self::ProductService => "Product or service",
            Self::PainReliever => "Pain reliever",
            Self::GainCreator => "Gain creator",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CanvasItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub item_type: ItemType,
    pub tags: Vec<String>,
    pub updated_at: String,
}

impl RowId for CanvasItem {
    fn row_id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasItemInput {
    pub title: String,
    pub description: Option<String>,
    pub item_type: ItemType,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CanvasItemInput {
    #[must_use]
    pub fn new(title: impl Into<String>, item_type: ItemType) -> Self {
        Self { title: title.into(), description: None, item_type, tags: Vec::new() }
    }

    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("title", &self.title);
        errors.into_result()
    }
}

/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list(pool: &PgPool, item_type: Option<ItemType>) -> Result<Vec<CanvasItem>, ContentError> {
    let sql = format!(
        "SELECT {COLUMNS} FROM canvas_items WHERE ($1::text IS NULL OR item_type = $1) ORDER BY lower(title)"
    );
    Ok(sqlx::query_as::<_, CanvasItem>(&sql)
        .bind(item_type.map(ItemType::as_str))
        .fetch_all(pool)
        .await?)
}

/// # Errors
///
/// Returns `NotFound` if no item has `id`.
pub async fn get(pool: &PgPool, id: Uuid) -> Result<CanvasItem, ContentError> {
    let sql = format!("SELECT {COLUMNS} FROM canvas_items WHERE id = $1");
    sqlx::query_as::<_, CanvasItem>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ContentError::NotFound { entity: ENTITY, id })
}

/// Items in `ids` order; ids with no row are skipped.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn get_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<CanvasItem>, ContentError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {COLUMNS} FROM canvas_items WHERE id = ANY($1) \
         ORDER BY array_position($1, id)"
    );
    Ok(sqlx::query_as::<_, CanvasItem>(&sql).bind(ids).fetch_all(pool).await?)
}

/// Case-insensitive title search limited to `allowed` types, skipping `exclude`.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn search(
    pool: &PgPool,
    query: &str,
    allowed: &[ItemType],
    exclude: &[Uuid],
    limit: i64,
) -> Result<Vec<CanvasItem>, ContentError> {
    let types: Vec<&str> = allowed.iter().map(|t| t.as_str()).collect();
    let pattern = format!("%{}%", escape_like(query.trim()));
    let sql = format!(
        "SELECT {COLUMNS} FROM canvas_items \
         WHERE item_type = ANY($1) AND title ILIKE $2 AND NOT (id = ANY($3)) \
         ORDER BY lower(title) LIMIT $4"
    );
    Ok(sqlx::query_as::<_, CanvasItem>(&sql)
        .bind(&types)
        .bind(pattern)
        .bind(exclude)
        .bind(limit)
        .fetch_all(pool)
        .await?)
}

/// # Errors
///
/// Returns validation errors or a database error.
pub async fn create(pool: &PgPool, input: &CanvasItemInput) -> Result<CanvasItem, ContentError> {
    input.validate()?;
    let id = Uuid::new_v4();
    let sql = format!(
        "INSERT INTO canvas_items (id, title, description, item_type, tags) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
    );
    let row = sqlx::query_as::<_, CanvasItem>(&sql)
        .bind(id)
        .bind(input.title.trim())
        .bind(clean_opt(input.description.as_deref()))
        .bind(input.item_type.as_str())
        .bind(clean_tags(&input.tags))
        .fetch_one(pool)
        .await?;
    info!(%id, item_type = %row.item_type, "canvas item created");
    Ok(row)
}

/// # Errors
///
/// Returns validation errors, `NotFound`, or a database error.
pub async fn update(pool: &PgPool, id: Uuid, input: &CanvasItemInput) -> Result<CanvasItem, ContentError> {
    input.validate()?;
    let sql = format!(
        "UPDATE canvas_items SET title = $2, description = $3, item_type = $4, tags = $5, updated_at = now() \
         WHERE id = $1 RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, CanvasItem>(&sql)
        .bind(id)
        .bind(input.title.trim())
        .bind(clean_opt(input.description.as_deref()))
        .bind(input.item_type.as_str())
        .bind(clean_tags(&input.tags))
        .fetch_optional(pool)
        .await?
        .ok_or(ContentError::NotFound { entity: ENTITY, id })
}

/// Deleting an item also removes its placements (FK cascade).
///
/// # Errors
///
/// Returns `NotFound` or a database error.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), ContentError> {
    let result = sqlx::query("DELETE FROM canvas_items WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    expect_affected(&result, ENTITY, id)?;
    info!(%id, "canvas item deleted");
    Ok(())
}

/// Escape `%`, `_` and `\` so user text matches literally inside ILIKE.
pub(crate) fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
#[path = "canvas_item_test.rs"]
mod tests;
