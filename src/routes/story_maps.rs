//! Story map routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::story_map::{self, StoryMap, StoryMapInput};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<StoryMap>>, ApiError> {
    Ok(Json(story_map::list(&state.pool).await?))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<StoryMap>, ApiError> {
    Ok(Json(story_map::get(&state.pool, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<StoryMapInput>,
) -> Result<(StatusCode, Json<StoryMap>), ApiError> {
    let map = story_map::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(map)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<StoryMapInput>,
) -> Result<Json<StoryMap>, ApiError> {
    Ok(Json(story_map::update(&state.pool, id, &input).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    story_map::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
