//! Story maps.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::fields::{clean_opt, text_enum};
use super::{ContentError, expect_affected};
use crate::error::FieldErrors;
use crate::views::config::RowId;

const ENTITY: &str = "story map";

const COLUMNS: &str = "id, title, description, status, \
    to_char(updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS updated_at";

text_enum! {
    StoryMapStatus {
        Draft => "draft",
        Active => "active",
        Archived => "archived",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StoryMap {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: StoryMapStatus,
    pub updated_at: String,
}

impl RowId for StoryMap {
    fn row_id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoryMapInput {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<StoryMapStatus>,
}

impl StoryMapInput {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("title", &self.title);
        errors.into_result()
    }

    fn status(&self) -> StoryMapStatus {
        self.status.unwrap_or(StoryMapStatus::Draft)
    }
}

/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list(pool: &PgPool) -> Result<Vec<StoryMap>, ContentError> {
    let sql = format!("SELECT {COLUMNS} FROM story_maps ORDER BY updated_at DESC");
    Ok(sqlx::query_as::<_, StoryMap>(&sql).fetch_all(pool).await?)
}

/// # Errors
///
/// Returns `NotFound` if no story map has `id`.
pub async fn get(pool: &PgPool, id: Uuid) -> Result<StoryMap, ContentError> {
    let sql = format!("SELECT {COLUMNS} FROM story_maps WHERE id = $1");
    sqlx::query_as::<_, StoryMap>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ContentError::NotFound { entity: ENTITY, id })
}

/// # Errors
///
/// Returns validation errors or a database error.
pub async fn create(pool: &PgPool, input: &StoryMapInput) -> Result<StoryMap, ContentError> {
    input.validate()?;
    let id = Uuid::new_v4();
    let sql = format!(
        "INSERT INTO story_maps (id, title, description, status) VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
    );
    let row = sqlx::query_as::<_, StoryMap>(&sql)
        .bind(id)
        .bind(input.title.trim())
        .bind(clean_opt(input.description.as_deref()))
        .bind(input.status().as_str())
        .fetch_one(pool)
        .await?;
    info!(%id, "story map created");
    Ok(row)
}

/// # Errors
///
/// Returns validation errors, `NotFound`, or a database error.
pub async fn update(pool: &PgPool, id: Uuid, input: &StoryMapInput) -> Result<StoryMap, ContentError> {
    input.validate()?;
    let sql = format!(
        "UPDATE story_maps SET title = $2, description = $3, status = $4, updated_at = now() \
         WHERE id = $1 RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, StoryMap>(&sql)
        .bind(id)
        .bind(input.title.trim())
        .bind(clean_opt(input.description.as_deref()))
        .bind(input.status().as_str())
        .fetch_optional(pool)
        .await?
        .ok_or(ContentError::NotFound { entity: ENTITY, id })
}

/// # Errors
///
/// Returns `NotFound` or a database error.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), ContentError> {
    let result = sqlx::query("DELETE FROM story_maps WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    expect_affected(&result, ENTITY, id)?;
    info!(%id, "story map deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_requires_title() {
        let input = StoryMapInput { title: String::new(), description: None, status: None };
        assert_eq!(input.validate().unwrap_err().get("title"), Some("is required"));
    }

    #[test]
    fn status_defaults_to_draft() {
        let input: StoryMapInput = serde_json::from_str(r#"{"title":"Onboarding"}"#).unwrap();
        assert_eq!(input.status(), StoryMapStatus::Draft);
        let input: StoryMapInput = serde_json::from_str(r#"{"title":"Onboarding","status":"active"}"#).unwrap();
        assert_eq!(input.status(), StoryMapStatus::Active);
    }
}
