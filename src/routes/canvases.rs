//! Canvas routes: the three canvas kinds, their layouts, block sync, and
//! the per-block linker popovers.
//!
//! DESIGN
//! ======
//! `{kind}` is one of `business_model`, `value_map`, `customer_profile`.
//! Block sync saves every submitted block independently and reports the
//! blocks that failed instead of failing the request; the client keeps its
//! local state and shows the warning.
//!
//! The canvas item linker runs with validation on (required title, allowed
//! type, duplicate links rejected). The assumption linker runs without it:
//! any category may be linked anywhere and relinking is a no-op.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::canvas::{self, BlockDef, Canvas, CanvasInput, CanvasKind, CanvasLayout, CanvasRef};
use crate::services::linker::{
    self, AssumptionTargets, BlockScope, Candidate, CanvasItemTargets, Draft, Linker,
};
use crate::services::options::{self, CanvasFormOptions};
use crate::services::placement::{
    self, AssumptionLinkEntry, BatchResult, PgAssumptionLinkStore, PgPlacementStore,
};
use crate::state::AppState;

fn parse_kind(raw: &str) -> Result<CanvasKind, ApiError> {
    CanvasKind::from_str(raw).ok_or_else(|| {
        ApiError::new(StatusCode::NOT_FOUND, "E_UNKNOWN_CANVAS_KIND", format!("unknown canvas kind: {raw}"))
    })
}

fn block_def(canvas: CanvasRef, key: &str) -> Result<&'static BlockDef, ApiError> {
    canvas.kind.block(key).ok_or_else(|| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            "E_UNKNOWN_BLOCK",
            format!("{} has no block {key}", canvas.kind.label()),
        )
    })
}

/// Resolve the path and make sure the canvas row exists.
async fn existing(state: &AppState, kind: &str, id: Uuid) -> Result<CanvasRef, ApiError> {
    let canvas = CanvasRef::new(parse_kind(kind)?, id);
    canvas::get(&state.pool, canvas).await?;
    Ok(canvas)
}

// =============================================================================
// CRUD
// =============================================================================

/// `GET /api/canvases/:kind`
pub async fn list(State(state): State<AppState>, Path(kind): Path<String>) -> Result<Json<Vec<Canvas>>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(canvas::list(&state.pool, kind).await?))
}

/// `POST /api/canvases/:kind`
pub async fn create(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(input): Json<CanvasInput>,
) -> Result<(StatusCode, Json<Canvas>), ApiError> {
    let kind = parse_kind(&kind)?;
    let row = canvas::create(&state.pool, kind, &input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /api/canvases/:kind/:id`
pub async fn get_one(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<Canvas>, ApiError> {
    let canvas = CanvasRef::new(parse_kind(&kind)?, id);
    Ok(Json(canvas::get(&state.pool, canvas).await?))
}

/// `PUT /api/canvases/:kind/:id`
pub async fn update(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(input): Json<CanvasInput>,
) -> Result<Json<Canvas>, ApiError> {
    let canvas = CanvasRef::new(parse_kind(&kind)?, id);
    Ok(Json(canvas::update(&state.pool, canvas, &input).await?))
}

/// `DELETE /api/canvases/:kind/:id`
pub async fn delete(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let canvas = CanvasRef::new(parse_kind(&kind)?, id);
    canvas::delete(&state.pool, canvas).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/canvases/:kind/:id/layout`
pub async fn layout(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<CanvasLayout>, ApiError> {
    let canvas = CanvasRef::new(parse_kind(&kind)?, id);
    Ok(Json(canvas::layout(&state.pool, canvas).await?))
}

/// `GET /api/canvas-form-options`
pub async fn form_options(State(state): State<AppState>) -> Result<Json<CanvasFormOptions>, ApiError> {
    Ok(Json(options::canvas_form_options(&state.pool).await?))
}

// =============================================================================
// BLOCK SYNC
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SyncBody<E> {
    pub blocks: BTreeMap<String, Vec<E>>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    #[serde(flatten)]
    pub result: BatchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<BatchResult> for SyncResponse {
    fn from(result: BatchResult) -> Self {
        let warning = result.warning();
        Self { result, warning }
    }
}

/// `PUT /api/canvases/:kind/:id/placements` with `{"blocks": {key: [item ids]}}`.
pub async fn sync_placements(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(body): Json<SyncBody<Uuid>>,
) -> Result<Json<SyncResponse>, ApiError> {
    let canvas = existing(&state, &kind, id).await?;
    let store = PgPlacementStore::new(state.pool.clone());
    Ok(Json(placement::sync_blocks(&store, &state.guards, canvas, &body.blocks).await.into()))
}

/// `PUT /api/canvases/:kind/:id/assumption-links` with
/// `{"blocks": {key: [{"id", "validation_status"?}]}}`.
pub async fn sync_assumption_links(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(body): Json<SyncBody<AssumptionLinkEntry>>,
) -> Result<Json<SyncResponse>, ApiError> {
    let canvas = existing(&state, &kind, id).await?;
    let store = PgAssumptionLinkStore::new(state.pool.clone());
    Ok(Json(placement::sync_blocks(&store, &state.guards, canvas, &body.blocks).await.into()))
}

// =============================================================================
// LINKERS
// =============================================================================

fn item_linker(state: &AppState) -> Linker<Uuid> {
    Linker::new(
        Arc::new(PgPlacementStore::new(state.pool.clone())),
        Arc::new(CanvasItemTargets::new(state.pool.clone())),
        state.guards.clone(),
        true,
    )
}

fn assumption_linker(state: &AppState) -> Linker<AssumptionLinkEntry> {
    Linker::new(
        Arc::new(PgAssumptionLinkStore::new(state.pool.clone())),
        Arc::new(AssumptionTargets::new(state.pool.clone())),
        state.guards.clone(),
        false,
    )
}

async fn item_scope(state: &AppState, kind: &str, id: Uuid, block: &str) -> Result<BlockScope, ApiError> {
    let canvas = CanvasRef::new(parse_kind(kind)?, id);
    let def = block_def(canvas, block)?;
    canvas::get(&state.pool, canvas).await?;
    Ok(BlockScope::new(canvas, def.key, linker::item_kinds(def.allowed)))
}

async fn assumption_scope(state: &AppState, kind: &str, id: Uuid, block: &str) -> Result<BlockScope, ApiError> {
    let canvas = CanvasRef::new(parse_kind(kind)?, id);
    let def = block_def(canvas, block)?;
    canvas::get(&state.pool, canvas).await?;
    Ok(BlockScope::new(canvas, def.key, linker::assumption_kinds()))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Link an existing record by id, or create one from a draft and link it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LinkRequest {
    Existing { id: Uuid },
    Create(Draft),
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<Candidate>,
    pub linked: Vec<Candidate>,
}

type BlockPath = Path<(String, Uuid, String)>;
type TargetPath = Path<(String, Uuid, String, Uuid)>;

/// `GET /api/canvases/:kind/:id/blocks/:block/items`
pub async fn linked_items(
    State(state): State<AppState>,
    Path((kind, id, block)): BlockPath,
) -> Result<Json<Vec<Candidate>>, ApiError> {
    let scope = item_scope(&state, &kind, id, &block).await?;
    Ok(Json(item_linker(&state).linked(&scope).await?))
}

/// `GET /api/canvases/:kind/:id/blocks/:block/search?q=`
pub async fn search_items(
    State(state): State<AppState>,
    Path((kind, id, block)): BlockPath,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Candidate>>, ApiError> {
    let scope = item_scope(&state, &kind, id, &block).await?;
    Ok(Json(item_linker(&state).search(&scope, &query.q).await?))
}

/// `POST /api/canvases/:kind/:id/blocks/:block/items`
pub async fn add_item(
    State(state): State<AppState>,
    Path((kind, id, block)): BlockPath,
    Json(request): Json<LinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), ApiError> {
    let scope = item_scope(&state, &kind, id, &block).await?;
    link_or_create(&item_linker(&state), &scope, request).await
}

/// `DELETE /api/canvases/:kind/:id/blocks/:block/items/:target_id`
pub async fn remove_item(
    State(state): State<AppState>,
    Path((kind, id, block, target_id)): TargetPath,
) -> Result<Json<Vec<Candidate>>, ApiError> {
    let scope = item_scope(&state, &kind, id, &block).await?;
    Ok(Json(item_linker(&state).unlink(&scope, target_id).await?))
}

/// `GET /api/canvases/:kind/:id/blocks/:block/assumptions`
pub async fn linked_assumptions(
    State(state): State<AppState>,
    Path((kind, id, block)): BlockPath,
) -> Result<Json<Vec<Candidate>>, ApiError> {
    let scope = assumption_scope(&state, &kind, id, &block).await?;
    Ok(Json(assumption_linker(&state).linked(&scope).await?))
}

/// `GET /api/canvases/:kind/:id/blocks/:block/assumptions/search?q=`
pub async fn search_assumptions(
    State(state): State<AppState>,
    Path((kind, id, block)): BlockPath,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Candidate>>, ApiError> {
    let scope = assumption_scope(&state, &kind, id, &block).await?;
    Ok(Json(assumption_linker(&state).search(&scope, &query.q).await?))
}

/// `POST /api/canvases/:kind/:id/blocks/:block/assumptions`
pub async fn add_assumption(
    State(state): State<AppState>,
    Path((kind, id, block)): BlockPath,
    Json(request): Json<LinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), ApiError> {
    let scope = assumption_scope(&state, &kind, id, &block).await?;
    link_or_create(&assumption_linker(&state), &scope, request).await
}

/// `DELETE /api/canvases/:kind/:id/blocks/:block/assumptions/:target_id`
pub async fn remove_assumption(
    State(state): State<AppState>,
    Path((kind, id, block, target_id)): TargetPath,
) -> Result<Json<Vec<Candidate>>, ApiError> {
    let scope = assumption_scope(&state, &kind, id, &block).await?;
    Ok(Json(assumption_linker(&state).unlink(&scope, target_id).await?))
}

async fn link_or_create<E: placement::BlockEntry>(
    linker: &Linker<E>,
    scope: &BlockScope,
    request: LinkRequest,
) -> Result<(StatusCode, Json<LinkResponse>), ApiError> {
    match request {
        LinkRequest::Existing { id } => {
            let linked = linker.link(scope, id).await?;
            Ok((StatusCode::OK, Json(LinkResponse { created: None, linked })))
        }
        LinkRequest::Create(draft) => {
            let outcome = linker.create_and_link(scope, &draft).await?;
            Ok((StatusCode::CREATED, Json(LinkResponse { created: Some(outcome.created), linked: outcome.linked })))
        }
    }
}

#[cfg(test)]
#[path = "canvases_test.rs"]
mod tests;
