//! Assumptions: testable beliefs behind a canvas, linked into blocks via
//! `assumption_links`.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::canvas_item::escape_like;
use super::fields::{clean_opt, text_enum};
use super::{ContentError, expect_affected};
use crate::error::FieldErrors;
use crate::views::config::RowId;

const ENTITY: &str = "assumption";

const COLUMNS: &str = "id, statement, category, importance, evidence, validation_status, notes, \
    to_char(updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS updated_at";

text_enum! {
    Category {
        Desirability => "desirability",
        Viability => "viability",
        Feasibility => "feasibility",
        Usability => "usability",
    }
}

text_enum! {
    Importance {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

text_enum! {
    /// Strength of the evidence collected so far.
    Evidence {
        None => "none",
        Weak => "weak",
        Moderate => "moderate",
        Strong => "strong",
    }
}

text_enum! {
    ValidationStatus {
        Untested => "untested",
        Testing => "testing",
        Validated => "validated",
        Invalidated => "invalidated",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Assumption {
    pub id: Uuid,
    pub statement: String,
    #[sqlx(try_from = "String")]
    pub category: Category,
    #[sqlx(try_from = "String")]
    pub importance: Importance,
    #[sqlx(try_from = "String")]
    pub evidence: Evidence,
    #[sqlx(try_from = "String")]
    pub validation_status: ValidationStatus,
    pub notes: Option<String>,
    pub updated_at: String,
}

impl RowId for Assumption {
    fn row_id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssumptionInput {
    pub statement: String,
    pub category: Option<Category>,
    pub importance: Option<Importance>,
    pub evidence: Option<Evidence>,
    pub validation_status: Option<ValidationStatus>,
    pub notes: Option<String>,
}

impl AssumptionInput {
    #[must_use]
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            category: None,
            importance: None,
            evidence: None,
            validation_status: None,
            notes: None,
        }
    }

    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("statement", &self.statement);
        errors.into_result()
    }

    fn category(&self) -> Category {
        self.category.unwrap_or(Category::Desirability)
    }

    fn importance(&self) -> Importance {
        self.importance.unwrap_or(Importance::Medium)
    }

    fn evidence(&self) -> Evidence {
        self.evidence.unwrap_or(Evidence::None)
    }

    fn validation_status(&self) -> ValidationStatus {
        self.validation_status.unwrap_or(ValidationStatus::Untested)
    }
}

/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list(pool: &PgPool) -> Result<Vec<Assumption>, ContentError> {
    let sql = format!("SELECT {COLUMNS} FROM assumptions ORDER BY created_at DESC");
    Ok(sqlx::query_as::<_, Assumption>(&sql).fetch_all(pool).await?)
}

/// # Errors
///
/// Returns `NotFound` if no assumption has `id`.
pub async fn get(pool: &PgPool, id: Uuid) -> Result<Assumption, ContentError> {
    let sql = format!("SELECT {COLUMNS} FROM assumptions WHERE id = $1");
    sqlx::query_as::<_, Assumption>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ContentError::NotFound { entity: ENTITY, id })
}

/// # Errors
///
/// Returns a database error if the query fails.
pub async fn get_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Assumption>, ContentError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!("SELECT {COLUMNS} FROM assumptions WHERE id = ANY($1) ORDER BY array_position($1, id)");
    Ok(sqlx::query_as::<_, Assumption>(&sql).bind(ids).fetch_all(pool).await?)
}

/// Case-insensitive statement search limited to `categories`, skipping `exclude`.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn search(
    pool: &PgPool,
    query: &str,
    categories: &[Category],
    exclude: &[Uuid],
    limit: i64,
) -> Result<Vec<Assumption>, ContentError> {
    let categories: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();
    let pattern = format!("%{}%", escape_like(query.trim()));
    let sql = format!(
        "SELECT {COLUMNS} FROM assumptions \
         WHERE category = ANY($1) AND statement ILIKE $2 AND NOT (id = ANY($3)) \
         ORDER BY lower(statement) LIMIT $4"
    );
    Ok(sqlx::query_as::<_, Assumption>(&sql)
        .bind(&categories)
        .bind(pattern)
        .bind(exclude)
        .bind(limit)
        .fetch_all(pool)
        .await?)
}

/// # Errors
///
/// Returns validation errors or a database error.
pub async fn create(pool: &PgPool, input: &AssumptionInput) -> Result<Assumption, ContentError> {
    input.validate()?;
    let id = Uuid::new_v4();
    let sql = format!(
        "INSERT INTO assumptions (id, statement, category, importance, evidence, validation_status, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}"
    );
    let row = sqlx::query_as::<_, Assumption>(&sql)
        .bind(id)
        .bind(input.statement.trim())
        .bind(input.category().as_str())
        .bind(input.importance().as_str())
        .bind(input.evidence().as_str())
        .bind(input.validation_status().as_str())
        .bind(clean_opt(input.notes.as_deref()))
        .fetch_one(pool)
        .await?;
    info!(%id, category = %row.category, "assumption created");
    Ok(row)
}

/// # Errors
///
/// Returns validation errors, `NotFound`, or a database error.
pub async fn update(pool: &PgPool, id: Uuid, input: &AssumptionInput) -> Result<Assumption, ContentError> {
    input.validate()?;
    let sql = format!(
        "UPDATE assumptions SET statement = $2, category = $3, importance = $4, evidence = $5, \
         validation_status = $6, notes = $7, updated_at = now() WHERE id = $1 RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, Assumption>(&sql)
        .bind(id)
        .bind(input.statement.trim())
        .bind(input.category().as_str())
        .bind(input.importance().as_str())
        .bind(input.evidence().as_str())
        .bind(input.validation_status().as_str())
        .bind(clean_opt(input.notes.as_deref()))
        .fetch_optional(pool)
        .await?
        .ok_or(ContentError::NotFound { entity: ENTITY, id })
}

/// # Errors
///
/// Returns `NotFound` or a database error.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), ContentError> {
    let result = sqlx::query("DELETE FROM assumptions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    expect_affected(&result, ENTITY, id)?;
    info!(%id, "assumption deleted");
    Ok(())
}

#[cfg(test)]
#[path = "assumption_test.rs"]
mod tests;
