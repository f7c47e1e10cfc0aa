//! Verbivore routes: glossary entries, terms, and the entry/term join.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::ai;
use crate::services::verbivore::{self, Entry, EntryInput, Term, TermInput};
use crate::state::AppState;

// =============================================================================
// ENTRIES
// =============================================================================

pub async fn list_entries(State(state): State<AppState>) -> Result<Json<Vec<Entry>>, ApiError> {
    Ok(Json(verbivore::list_entries(&state.pool).await?))
}

pub async fn get_entry(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Entry>, ApiError> {
    Ok(Json(verbivore::get_entry(&state.pool, id).await?))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Json(input): Json<EntryInput>,
) -> Result<(StatusCode, Json<Entry>), ApiError> {
    let entry = verbivore::create_entry(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<EntryInput>,
) -> Result<Json<Entry>, ApiError> {
    Ok(Json(verbivore::update_entry(&state.pool, id, &input).await?))
}

pub async fn delete_entry(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    verbivore::delete_entry(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// TERMS
// =============================================================================

pub async fn list_terms(State(state): State<AppState>) -> Result<Json<Vec<Term>>, ApiError> {
    Ok(Json(verbivore::list_terms(&state.pool).await?))
}

pub async fn get_term(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Term>, ApiError> {
    Ok(Json(verbivore::get_term(&state.pool, id).await?))
}

pub async fn create_term(
    State(state): State<AppState>,
    Json(input): Json<TermInput>,
) -> Result<(StatusCode, Json<Term>), ApiError> {
    let term = verbivore::create_term(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(term)))
}

pub async fn update_term(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<TermInput>,
) -> Result<Json<Term>, ApiError> {
    Ok(Json(verbivore::update_term(&state.pool, id, &input).await?))
}

pub async fn delete_term(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    verbivore::delete_term(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// ENTRY TERMS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct EntryTermsBody {
    pub term_ids: Vec<Uuid>,
}

/// `GET /api/verbivore/entries/:id/terms`
pub async fn entry_terms(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Vec<Term>>, ApiError> {
    Ok(Json(verbivore::entry_terms(&state.pool, id).await?))
}

/// `PUT /api/verbivore/entries/:id/terms` replaces the ordered term list.
pub async fn set_entry_terms(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<EntryTermsBody>,
) -> Result<Json<Vec<Term>>, ApiError> {
    Ok(Json(verbivore::set_entry_terms(&state.pool, id, &body.term_ids).await?))
}

#[derive(Debug, Serialize)]
pub struct ExtractedTerms {
    pub terms: Vec<String>,
}

/// `POST /api/verbivore/entries/:id/extract-terms` suggests glossary terms
/// from the entry's content. Empty when AI assistance is unavailable.
pub async fn extract_terms(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExtractedTerms>, ApiError> {
    let entry = verbivore::get_entry(&state.pool, id).await?;
    let terms = ai::extract_terms(state.ai(), &entry.content).await;
    Ok(Json(ExtractedTerms { terms }))
}
