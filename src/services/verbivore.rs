//! Verbivore: a glossary blog of entries and the terms they define.
//!
//! Entries and terms are edited independently; which terms an entry covers
//! is saved as a whole ordered list through [`set_entry_terms`].

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::fields::{clean_opt, slug_or_derive, text_enum};
use super::links::{self, VERBIVORE_ENTRY_TERMS};
use super::{ContentError, expect_affected};
use crate::error::FieldErrors;
use crate::views::config::RowId;

const ENTRY: &str = "verbivore entry";
const TERM: &str = "verbivore term";

const ENTRY_COLUMNS: &str = "id, title, slug, excerpt, content, status, \
    to_char(updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS updated_at";

const TERM_COLUMNS: &str = "id, term, slug, definition, \
    to_char(updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS updated_at";

const JOINED_TERM_COLUMNS: &str = "t.id, t.term, t.slug, t.definition, \
    to_char(t.updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS updated_at";

text_enum! {
    EntryStatus {
        Draft => "draft",
        Published => "published",
    }
}

// =============================================================================
// ENTRIES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Entry {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    #[sqlx(try_from = "String")]
    pub status: EntryStatus,
    pub updated_at: String,
}

impl RowId for Entry {
    fn row_id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryInput {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    pub status: Option<EntryStatus>,
}

impl EntryInput {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("title", &self.title);
        if !self.title.trim().is_empty() && self.slug().is_empty() {
            errors.add("slug", "could not be derived from the title");
        }
        // Published entries must have body text.
        if self.status == Some(EntryStatus::Published) {
            errors.require("content", &self.content);
        }
        errors.into_result()
    }

    #[must_use]
    pub fn slug(&self) -> String {
        slug_or_derive(self.slug.as_deref(), &self.title)
    }
}

/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_entries(pool: &PgPool) -> Result<Vec<Entry>, ContentError> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM verbivore_entries ORDER BY updated_at DESC");
    Ok(sqlx::query_as::<_, Entry>(&sql).fetch_all(pool).await?)
}

/// # Errors
///
/// Returns `NotFound` if no entry has `id`.
pub async fn get_entry(pool: &PgPool, id: Uuid) -> Result<Entry, ContentError> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM verbivore_entries WHERE id = $1");
    sqlx::query_as::<_, Entry>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ContentError::NotFound { entity: ENTRY, id })
}

/// # Errors
///
/// Returns validation errors, a slug conflict, or a database error.
pub async fn create_entry(pool: &PgPool, input: &EntryInput) -> Result<Entry, ContentError> {
    input.validate()?;
    let id = Uuid::new_v4();
    let sql = format!(
        "INSERT INTO verbivore_entries (id, title, slug, excerpt, content, status) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ENTRY_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Entry>(&sql)
        .bind(id)
        .bind(input.title.trim())
        .bind(input.slug())
        .bind(clean_opt(input.excerpt.as_deref()))
        .bind(&input.content)
        .bind(input.status.unwrap_or(EntryStatus::Draft).as_str())
        .fetch_one(pool)
        .await?;
    info!(%id, slug = %row.slug, "verbivore entry created");
    Ok(row)
}

/// # Errors
///
/// Returns validation errors, `NotFound`, a slug conflict, or a database error.
pub async fn update_entry(pool: &PgPool, id: Uuid, input: &EntryInput) -> Result<Entry, ContentError> {
    input.validate()?;
    let sql = format!(
        "UPDATE verbivore_entries SET title = $2, slug = $3, excerpt = $4, content = $5, status = $6, \
         updated_at = now() WHERE id = $1 RETURNING {ENTRY_COLUMNS}"
    );
    sqlx::query_as::<_, Entry>(&sql)
        .bind(id)
        .bind(input.title.trim())
        .bind(input.slug())
        .bind(clean_opt(input.excerpt.as_deref()))
        .bind(&input.content)
        .bind(input.status.unwrap_or(EntryStatus::Draft).as_str())
        .fetch_optional(pool)
        .await?
        .ok_or(ContentError::NotFound { entity: ENTRY, id })
}

/// # Errors
///
/// Returns `NotFound` or a database error.
pub async fn delete_entry(pool: &PgPool, id: Uuid) -> Result<(), ContentError> {
    let result = sqlx::query("DELETE FROM verbivore_entries WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    expect_affected(&result, ENTRY, id)?;
    info!(%id, "verbivore entry deleted");
    Ok(())
}

// =============================================================================
// TERMS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Term {
    pub id: Uuid,
    pub term: String,
    pub slug: String,
    pub definition: String,
    pub updated_at: String,
}

impl RowId for Term {
    fn row_id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermInput {
    pub term: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub definition: String,
}

impl TermInput {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("term", &self.term);
        if !self.term.trim().is_empty() && self.slug().is_empty() {
            errors.add("slug", "could not be derived from the term");
        }
        errors.into_result()
    }

    #[must_use]
    pub fn slug(&self) -> String {
        slug_or_derive(self.slug.as_deref(), &self.term)
    }
}

/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_terms(pool: &PgPool) -> Result<Vec<Term>, ContentError> {
    let sql = format!("SELECT {TERM_COLUMNS} FROM verbivore_terms ORDER BY lower(term)");
    Ok(sqlx::query_as::<_, Term>(&sql).fetch_all(pool).await?)
}

/// # Errors
///
/// Returns `NotFound` if no term has `id`.
pub async fn get_term(pool: &PgPool, id: Uuid) -> Result<Term, ContentError> {
    let sql = format!("SELECT {TERM_COLUMNS} FROM verbivore_terms WHERE id = $1");
    sqlx::query_as::<_, Term>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ContentError::NotFound { entity: TERM, id })
}

/// # Errors
///
/// Returns validation errors, a slug conflict, or a database error.
pub async fn create_term(pool: &PgPool, input: &TermInput) -> Result<Term, ContentError> {
    input.validate()?;
    let id = Uuid::new_v4();
    let sql = format!(
        "INSERT INTO verbivore_terms (id, term, slug, definition) VALUES ($1, $2, $3, $4) RETURNING {TERM_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Term>(&sql)
        .bind(id)
        .bind(input.term.trim())
        .bind(input.slug())
        .bind(input.definition.trim())
        .fetch_one(pool)
        .await?;
    info!(%id, slug = %row.slug, "verbivore term created");
    Ok(row)
}

/// # Errors
///
/// Returns validation errors, `NotFound`, a slug conflict, or a database error.
pub async fn update_term(pool: &PgPool, id: Uuid, input: &TermInput) -> Result<Term, ContentError> {
    input.validate()?;
    let sql = format!(
        "UPDATE verbivore_terms SET term = $2, slug = $3, definition = $4, updated_at = now() \
         WHERE id = $1 RETURNING {TERM_COLUMNS}"
    );
    sqlx::query_as::<_, Term>(&sql)
        .bind(id)
        .bind(input.term.trim())
        .bind(input.slug())
        .bind(input.definition.trim())
        .fetch_optional(pool)
        .await?
        .ok_or(ContentError::NotFound { entity: TERM, id })
}

/// # Errors
///
/// Returns `NotFound` or a database error.
pub async fn delete_term(pool: &PgPool, id: Uuid) -> Result<(), ContentError> {
    let result = sqlx::query("DELETE FROM verbivore_terms WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    expect_affected(&result, TERM, id)?;
    info!(%id, "verbivore term deleted");
    Ok(())
}

// =============================================================================
// ENTRY TERMS
// =============================================================================

/// Terms attached to an entry, in saved order.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn entry_terms(pool: &PgPool, entry_id: Uuid) -> Result<Vec<Term>, ContentError> {
    let sql = format!(
        "SELECT {JOINED_TERM_COLUMNS} FROM verbivore_terms t JOIN verbivore_entry_terms et ON et.term_id = t.id \
         WHERE et.entry_id = $1 ORDER BY et.position"
    );
    Ok(sqlx::query_as::<_, Term>(&sql).bind(entry_id).fetch_all(pool).await?)
}

/// Replace the entry's term list.
///
/// # Errors
///
/// Returns `NotFound` for a missing entry, or a database error.
pub async fn set_entry_terms(pool: &PgPool, entry_id: Uuid, term_ids: &[Uuid]) -> Result<Vec<Term>, ContentError> {
    get_entry(pool, entry_id).await?;
    links::replace_join(pool, VERBIVORE_ENTRY_TERMS, entry_id, term_ids).await?;
    entry_terms(pool, entry_id).await
}

#[cfg(test)]
#[path = "verbivore_test.rs"]
mod tests;
