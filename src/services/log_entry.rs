//! Log entries: dated journal posts for the portfolio site.
//!
//! DESIGN
//! ======
//! Entries are plain rows; `status` is a closed enum edited directly (there
//! are no transition rules). The kanban board on the list page moves
//! entries between statuses through [`StatusMover`], which answers with the
//! freshly reloaded list so the board redraws from the database. When the
//! status write lands but the reload fails, the board's own rows are
//! patched instead (see [`after_status_write`]).

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::fields::{check_date, check_url, clean_opt, clean_tags, slug_or_derive, text_enum};
use super::{ContentError, expect_affected};
use crate::error::FieldErrors;
use crate::views::config::RowId;
use crate::views::kanban::{MoveError, MoveHandler};

const ENTITY: &str = "log entry";

const COLUMNS: &str = "id, title, slug, summary, content, \
    to_char(entry_date, 'YYYY-MM-DD') AS entry_date, status, tags, cover_url, \
    to_char(updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS updated_at";

text_enum! {
    /// Publication state of a log entry.
    LogStatus {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct LogEntry {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content: String,
    pub entry_date: String,
    #[sqlx(try_from = "String")]
    pub status: LogStatus,
    pub tags: Vec<String>,
    pub cover_url: Option<String>,
    pub updated_at: String,
}

impl RowId for LogEntry {
    fn row_id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogEntryInput {
    pub title: String,
    pub slug: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub content: String,
    pub entry_date: String,
    pub status: Option<LogStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub cover_url: Option<String>,
}

impl LogEntryInput {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("title", &self.title);
        if self.entry_date.trim().is_empty() {
            errors.add("entry_date", "is required");
        } else {
            check_date(&mut errors, "entry_date", &self.entry_date);
        }
        check_url(&mut errors, "cover_url", self.cover_url.as_deref());
        if !self.title.trim().is_empty() && self.slug().is_empty() {
            errors.add("slug", "could not be derived from the title");
        }
        errors.into_result()
    }

    #[must_use]
    pub fn slug(&self) -> String {
        slug_or_derive(self.slug.as_deref(), &self.title)
    }
}

// =============================================================================
// CRUD
// =============================================================================

/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list(pool: &PgPool) -> Result<Vec<LogEntry>, ContentError> {
    let sql = format!("SELECT {COLUMNS} FROM log_entries ORDER BY entry_date DESC, created_at DESC");
    Ok(sqlx::query_as::<_, LogEntry>(&sql).fetch_all(pool).await?)
}

/// # Errors
///
/// Returns `NotFound` if no entry has `id`.
pub async fn get(pool: &PgPool, id: Uuid) -> Result<LogEntry, ContentError> {
    let sql = format!("SELECT {COLUMNS} FROM log_entries WHERE id = $1");
    sqlx::query_as::<_, LogEntry>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ContentError::NotFound { entity: ENTITY, id })
}

/// # Errors
///
/// Returns validation errors, a slug conflict, or a database error.
pub async fn create(pool: &PgPool, input: &LogEntryInput) -> Result<LogEntry, ContentError> {
    input.validate()?;
    let id = Uuid::new_v4();
    let sql = format!(
        "INSERT INTO log_entries (id, title, slug, summary, content, entry_date, status, tags, cover_url) \
         VALUES ($1, $2, $3, $4, $5, $6::date, $7, $8, $9) RETURNING {COLUMNS}"
    );
    let row = sqlx::query_as::<_, LogEntry>(&sql)
        .bind(id)
        .bind(input.title.trim())
        .bind(input.slug())
        .bind(clean_opt(input.summary.as_deref()))
        .bind(&input.content)
        .bind(input.entry_date.trim())
        .bind(input.status.unwrap_or(LogStatus::Draft).as_str())
        .bind(clean_tags(&input.tags))
        .bind(clean_opt(input.cover_url.as_deref()))
        .fetch_one(pool)
        .await?;
    info!(%id, slug = %row.slug, "log entry created");
    Ok(row)
}

/// # Errors
///
/// Returns validation errors, `NotFound`, a slug conflict, or a database error.
pub async fn update(pool: &PgPool, id: Uuid, input: &LogEntryInput) -> Result<LogEntry, ContentError> {
    input.validate()?;
    let sql = format!(
        "UPDATE log_entries SET title = $2, slug = $3, summary = $4, content = $5, entry_date = $6::date, \
         status = $7, tags = $8, cover_url = $9, updated_at = now() WHERE id = $1 RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, LogEntry>(&sql)
        .bind(id)
        .bind(input.title.trim())
        .bind(input.slug())
        .bind(clean_opt(input.summary.as_deref()))
        .bind(&input.content)
        .bind(input.entry_date.trim())
        .bind(input.status.unwrap_or(LogStatus::Draft).as_str())
        .bind(clean_tags(&input.tags))
        .bind(clean_opt(input.cover_url.as_deref()))
        .fetch_optional(pool)
        .await?
        .ok_or(ContentError::NotFound { entity: ENTITY, id })
}

/// # Errors
///
/// Returns `NotFound` or a database error.
pub async fn set_status(pool: &PgPool, id: Uuid, status: LogStatus) -> Result<(), ContentError> {
    let result = sqlx::query("UPDATE log_entries SET status = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
    expect_affected(&result, ENTITY, id)
}

/// # Errors
///
/// Returns `NotFound` or a database error.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), ContentError> {
    let result = sqlx::query("DELETE FROM log_entries WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    expect_affected(&result, ENTITY, id)?;
    info!(%id, "log entry deleted");
    Ok(())
}

// =============================================================================
// KANBAN MOVES
// =============================================================================

/// Rows to redraw after a status write that already committed.
///
/// A failed reload falls back to `rows` with `item_id` moved to `status`.
#[must_use]
pub fn after_status_write(
    rows: &[LogEntry],
    item_id: Uuid,
    status: LogStatus,
    reloaded: Result<Vec<LogEntry>, ContentError>,
) -> Vec<LogEntry> {
    match reloaded {
        Ok(fresh) => fresh,
        Err(e) => {
            warn!(%item_id, status = %status, error = %e, "reload after status move failed; patching board rows");
            rows.iter()
                .cloned()
                .map(|mut row| {
                    if row.id == item_id {
                        row.status = status;
                    }
                    row
                })
                .collect()
        }
    }
}

/// Persists kanban drops as status changes.
pub struct StatusMover {
    pool: PgPool,
}

impl StatusMover {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MoveHandler<LogEntry> for StatusMover {
    async fn move_item(&self, rows: &[LogEntry], item_id: Uuid, to_group: &str) -> Result<Vec<LogEntry>, MoveError> {
        let status = LogStatus::from_str(to_group).ok_or_else(|| MoveError(format!("unknown status {to_group}")))?;
        set_status(&self.pool, item_id, status)
            .await
            .map_err(|e| MoveError(e.to_string()))?;
        Ok(after_status_write(rows, item_id, status, list(&self.pool).await))
    }
}

#[cfg(test)]
#[path = "log_entry_test.rs"]
mod tests;
