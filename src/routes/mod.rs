//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the JSON admin API under a single Axum router. Each
//! resource lives in its own file; service errors are translated into
//! [`ApiError`] here so handlers can use `?` throughout.

pub mod ai;
pub mod assumptions;
pub mod canvas_items;
pub mod canvases;
pub mod links;
pub mod log_entries;
pub mod story_maps;
pub mod verbivore;
pub mod views;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ErrorCode};
use crate::services::ContentError;
use crate::services::linker::LinkerError;
use crate::state::AppState;
use crate::views::boundary::RenderError;
use crate::views::switcher::SwitcherError;

/// Full API router with shared middleware.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/log-entries", get(log_entries::list).post(log_entries::create))
        .route("/api/log-entries/view", get(log_entries::view))
        .route("/api/log-entries/board/move", post(log_entries::move_card))
        .route(
            "/api/log-entries/{id}",
            get(log_entries::get_one)
                .put(log_entries::update)
                .delete(log_entries::delete),
        )
        .route("/api/canvas-items", get(canvas_items::list).post(canvas_items::create))
        .route("/api/canvas-items/view", get(canvas_items::view))
        .route(
            "/api/canvas-items/{id}",
            get(canvas_items::get_one)
                .put(canvas_items::update)
                .delete(canvas_items::delete),
        )
        .route("/api/assumptions", get(assumptions::list).post(assumptions::create))
        .route(
            "/api/assumptions/{id}",
            get(assumptions::get_one)
                .put(assumptions::update)
                .delete(assumptions::delete),
        )
        .route("/api/story-maps", get(story_maps::list).post(story_maps::create))
        .route(
            "/api/story-maps/{id}",
            get(story_maps::get_one)
                .put(story_maps::update)
                .delete(story_maps::delete),
        )
        .route("/api/canvas-form-options", get(canvases::form_options))
        .route("/api/canvases/{kind}", get(canvases::list).post(canvases::create))
        .route(
            "/api/canvases/{kind}/{id}",
            get(canvases::get_one)
                .put(canvases::update)
                .delete(canvases::delete),
        )
        .route("/api/canvases/{kind}/{id}/layout", get(canvases::layout))
        .route("/api/canvases/{kind}/{id}/placements", put(canvases::sync_placements))
        .route("/api/canvases/{kind}/{id}/assumption-links", put(canvases::sync_assumption_links))
        .route("/api/canvases/{kind}/{id}/blocks/{block}/search", get(canvases::search_items))
        .route(
            "/api/canvases/{kind}/{id}/blocks/{block}/items",
            get(canvases::linked_items).post(canvases::add_item),
        )
        .route(
            "/api/canvases/{kind}/{id}/blocks/{block}/items/{target_id}",
            axum::routing::delete(canvases::remove_item),
        )
        .route(
            "/api/canvases/{kind}/{id}/blocks/{block}/assumptions",
            get(canvases::linked_assumptions).post(canvases::add_assumption),
        )
        .route(
            "/api/canvases/{kind}/{id}/blocks/{block}/assumptions/search",
            get(canvases::search_assumptions),
        )
        .route(
            "/api/canvases/{kind}/{id}/blocks/{block}/assumptions/{target_id}",
            axum::routing::delete(canvases::remove_assumption),
        )
        .route(
            "/api/links/{source_type}/{source_id}",
            get(links::list).put(links::replace),
        )
        .route("/api/verbivore/entries", get(verbivore::list_entries).post(verbivore::create_entry))
        .route(
            "/api/verbivore/entries/{id}",
            get(verbivore::get_entry)
                .put(verbivore::update_entry)
                .delete(verbivore::delete_entry),
        )
        .route(
            "/api/verbivore/entries/{id}/terms",
            get(verbivore::entry_terms).put(verbivore::set_entry_terms),
        )
        .route("/api/verbivore/entries/{id}/extract-terms", post(verbivore::extract_terms))
        .route("/api/verbivore/terms", get(verbivore::list_terms).post(verbivore::create_term))
        .route(
            "/api/verbivore/terms/{id}",
            get(verbivore::get_term)
                .put(verbivore::update_term)
                .delete(verbivore::delete_term),
        )
        .route("/api/views/events", get(views::events))
        .route("/api/views/{key}", get(views::get_view).put(views::put_view))
        .route("/api/views/{key}/reset", post(views::reset_view))
        .route("/api/ai/generate", post(ai::generate))
        .route("/api/ai/suggest", post(ai::suggest))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Validation(fields) => ApiError::validation(fields),
            ContentError::NotFound { .. } => ApiError::from_code(StatusCode::NOT_FOUND, &err),
            ContentError::Conflict(_) => ApiError::from_code(StatusCode::CONFLICT, &err),
            ContentError::Database(_) if err.retryable() => ApiError::from_code(StatusCode::SERVICE_UNAVAILABLE, &err),
            ContentError::Database(_) => ApiError::from_code(StatusCode::INTERNAL_SERVER_ERROR, &err),
        }
    }
}

impl From<LinkerError> for ApiError {
    fn from(err: LinkerError) -> Self {
        match err {
            LinkerError::Content(inner) => inner.into(),
            LinkerError::Validation(fields) => ApiError::validation(fields),
            LinkerError::Busy(_) | LinkerError::Duplicate(_) => ApiError::from_code(StatusCode::CONFLICT, &err),
            LinkerError::NotAllowed { .. } => ApiError::from_code(StatusCode::UNPROCESSABLE_ENTITY, &err),
            LinkerError::TargetNotFound(_) => ApiError::from_code(StatusCode::NOT_FOUND, &err),
        }
    }
}

impl From<SwitcherError> for ApiError {
    fn from(err: SwitcherError) -> Self {
        let status = match err {
            SwitcherError::NoViews | SwitcherError::Unavailable(_) => StatusCode::BAD_REQUEST,
            SwitcherError::NothingPending => StatusCode::CONFLICT,
        };
        ApiError::from_code(status, &err)
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        ApiError::from_code(StatusCode::INTERNAL_SERVER_ERROR, &err)
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
