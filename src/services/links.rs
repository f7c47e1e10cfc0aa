//! Replace-all link tables.
//!
//! Generic entity links (`entity_links`) and simple two-column join tables
//! (`verbivore_entry_terms`) are both saved by deleting the owner's rows
//! and inserting the submitted list with fresh positions, in one
//! transaction per owner. There is no diffing.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::ContentError;
use super::fields::text_enum;
use crate::error::FieldErrors;

text_enum! {
    /// Anything that can sit on either end of an entity link.
    EntityType {
        LogEntry => "log_entry",
        CanvasItem => "canvas_item",
        Assumption => "assumption",
        StoryMap => "story_map",
        BusinessModel => "business_model",
        ValueMap => "value_map",
        CustomerProfile => "customer_profile",
        VerbivoreEntry => "verbivore_entry",
        VerbivoreTerm => "verbivore_term",
    }
}

const DEFAULT_LINK_TYPE: &str = "related";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTarget {
    pub target_type: EntityType,
    pub target_id: Uuid,
    #[serde(default)]
    pub link_type: Option<String>,
}

impl LinkTarget {
    fn link_type(&self) -> &str {
        self.link_type.as_deref().map(str::trim).filter(|t| !t.is_empty()).unwrap_or(DEFAULT_LINK_TYPE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityLink {
    pub target_type: EntityType,
    pub target_id: Uuid,
    pub link_type: String,
    pub position: i32,
}

/// Reject self links and repeated `(type, id, link_type)` triples.
///
/// # Errors
///
/// Returns field errors keyed `targets[i]`.
pub fn validate_targets(source_type: EntityType, source_id: Uuid, targets: &[LinkTarget]) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut seen = HashSet::new();
    for (i, target) in targets.iter().enumerate() {
        let field = format!("targets[{i}]");
        if target.target_type == source_type && target.target_id == source_id {
            errors.add(&field, "cannot link an entity to itself");
        } else if !seen.insert((target.target_type, target.target_id, target.link_type().to_owned())) {
            errors.add(&field, "is listed more than once");
        }
    }
    errors.into_result()
}

/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_links(pool: &PgPool, source_type: EntityType, source_id: Uuid) -> Result<Vec<EntityLink>, ContentError> {
    let rows = sqlx::query_as::<_, (String, Uuid, String, i32)>(
        "SELECT target_type, target_id, link_type, position FROM entity_links \
         WHERE source_type = $1 AND source_id = $2 ORDER BY position",
    )
    .bind(source_type.as_str())
    .bind(source_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(target_type, target_id, link_type, position)| {
            EntityType::from_str(&target_type).map(|target_type| EntityLink { target_type, target_id, link_type, position })
        })
        .collect())
}

/// Replace every link owned by `(source_type, source_id)` with `targets`.
///
/// # Errors
///
/// Returns validation errors or a database error; on error nothing changes.
pub async fn replace_links(
    pool: &PgPool,
    source_type: EntityType,
    source_id: Uuid,
    targets: &[LinkTarget],
) -> Result<Vec<EntityLink>, ContentError> {
    validate_targets(source_type, source_id, targets)?;
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM entity_links WHERE source_type = $1 AND source_id = $2")
        .bind(source_type.as_str())
        .bind(source_id)
        .execute(&mut *tx)
        .await?;
    let mut saved = Vec::with_capacity(targets.len());
    for (position, target) in (0_i32..).zip(targets) {
        sqlx::query(
            "INSERT INTO entity_links (source_type, source_id, target_type, target_id, link_type, position) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(source_type.as_str())
        .bind(source_id)
        .bind(target.target_type.as_str())
        .bind(target.target_id)
        .bind(target.link_type())
        .bind(position)
        .execute(&mut *tx)
        .await?;
        saved.push(EntityLink {
            target_type: target.target_type,
            target_id: target.target_id,
            link_type: target.link_type().to_owned(),
            position,
        });
    }
    tx.commit().await?;
    info!(source_type = %source_type, %source_id, count = saved.len(), "entity links replaced");
    Ok(saved)
}

// =============================================================================
// JOIN TABLES
// =============================================================================

/// A positioned two-column join table.
#[derive(Debug, Clone, Copy)]
pub struct JoinTable {
    pub table: &'static str,
    pub owner: &'static str,
    pub target: &'static str,
}

pub const VERBIVORE_ENTRY_TERMS: JoinTable =
    JoinTable { table: "verbivore_entry_terms", owner: "entry_id", target: "term_id" };

/// Target ids for `owner_id` in saved order.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn join_ids(pool: &PgPool, join: JoinTable, owner_id: Uuid) -> Result<Vec<Uuid>, ContentError> {
    let sql = format!(
        "SELECT {target} FROM {table} WHERE {owner} = $1 ORDER BY position",
        target = join.target,
        table = join.table,
        owner = join.owner
    );
    Ok(sqlx::query_scalar::<_, Uuid>(&sql).bind(owner_id).fetch_all(pool).await?)
}

/// Replace `owner_id`'s rows with `ids`, dropping repeats.
///
/// # Errors
///
/// Returns a database error (including FK violations for unknown ids);
/// on error nothing changes.
pub async fn replace_join(pool: &PgPool, join: JoinTable, owner_id: Uuid, ids: &[Uuid]) -> Result<Vec<Uuid>, ContentError> {
    let mut seen = HashSet::new();
    let ids: Vec<Uuid> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

    let mut tx = pool.begin().await?;
    sqlx::query(&format!("DELETE FROM {} WHERE {} = $1", join.table, join.owner))
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;
    let insert = format!(
        "INSERT INTO {table} ({owner}, {target}, position) VALUES ($1, $2, $3)",
        table = join.table,
        owner = join.owner,
        target = join.target
    );
    for (position, id) in (0_i32..).zip(&ids) {
        sqlx::query(&insert).bind(owner_id).bind(id).bind(position).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    info!(table = join.table, %owner_id, count = ids.len(), "join rows replaced");
    Ok(ids)
}

#[cfg(test)]
#[path = "links_test.rs"]
mod tests;
