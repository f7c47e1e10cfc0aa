//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own validation and persistence so route handlers can stay
//! focused on request translation. Content services share [`ContentError`];
//! the sync and linking services carry their own error types because their
//! failure modes (partial batches, in-flight guards) differ.

pub mod ai;
pub mod assumption;
pub mod canvas;
pub mod canvas_item;
pub mod fields;
pub mod guard;
pub mod linker;
pub mod links;
pub mod log_entry;
pub mod options;
pub mod placement;
pub mod story_map;
pub mod verbivore;

use uuid::Uuid;

use crate::error::FieldErrors;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for ContentError {
    fn from(err: sqlx::Error) -> Self {
        // Unique violations are user-facing conflicts (duplicate slugs).
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some("23505") {
                return Self::Conflict(db.message().to_owned());
            }
        }
        Self::Database(err)
    }
}

impl From<FieldErrors> for ContentError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl crate::error::ErrorCode for ContentError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "E_NOT_FOUND",
            Self::Validation(_) => "E_VALIDATION",
            Self::Conflict(_) => "E_CONFLICT",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)))
    }
}

/// Map a zero-row update/delete to `NotFound`.
pub(crate) fn expect_affected(
    result: &sqlx::postgres::PgQueryResult,
    entity: &'static str,
    id: Uuid,
) -> Result<(), ContentError> {
    if result.rows_affected() == 0 {
        return Err(ContentError::NotFound { entity, id });
    }
    Ok(())
}
