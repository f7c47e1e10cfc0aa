//! Generic entity link routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::links::{self, EntityLink, EntityType, LinkTarget};
use crate::state::AppState;

fn parse_source(raw: &str) -> Result<EntityType, ApiError> {
    EntityType::from_str(raw)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "E_UNKNOWN_ENTITY_TYPE", format!("unknown entity type: {raw}")))
}

#[derive(Debug, Deserialize)]
pub struct ReplaceLinksBody {
    pub targets: Vec<LinkTarget>,
}

/// `GET /api/links/:source_type/:source_id`
pub async fn list(
    State(state): State<AppState>,
    Path((source_type, source_id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<EntityLink>>, ApiError> {
    let source_type = parse_source(&source_type)?;
    Ok(Json(links::list_links(&state.pool, source_type, source_id).await?))
}

/// `PUT /api/links/:source_type/:source_id` replaces the full ordered list.
pub async fn replace(
    State(state): State<AppState>,
    Path((source_type, source_id)): Path<(String, Uuid)>,
    Json(body): Json<ReplaceLinksBody>,
) -> Result<Json<Vec<EntityLink>>, ApiError> {
    let source_type = parse_source(&source_type)?;
    Ok(Json(links::replace_links(&state.pool, source_type, source_id, &body.targets).await?))
}
