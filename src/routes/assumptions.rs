//! Assumption routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::assumption::{self, Assumption, AssumptionInput};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Assumption>>, ApiError> {
    Ok(Json(assumption::list(&state.pool).await?))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Assumption>, ApiError> {
    Ok(Json(assumption::get(&state.pool, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<AssumptionInput>,
) -> Result<(StatusCode, Json<Assumption>), ApiError> {
    let row = assumption::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<AssumptionInput>,
) -> Result<Json<Assumption>, ApiError> {
    Ok(Json(assumption::update(&state.pool, id, &input).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    assumption::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
