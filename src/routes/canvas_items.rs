//! Canvas item routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::views::parse_view;
use crate::error::ApiError;
use crate::services::canvas::CanvasKind;
use crate::services::canvas_item::{self, CanvasItem, CanvasItemInput, ItemType};
use crate::state::AppState;
use crate::views::ViewType;
use crate::views::config::{CanvasBlockDef, CanvasConfig, CardConfig, Column, TableConfig, ViewConfigs};
use crate::views::data_view::{DataView, DataViewModel, EmptyState};

pub const VIEW_KEY: &str = "canvas-items";

fn card() -> CardConfig<CanvasItem> {
    CardConfig::new(|i: &CanvasItem| i.title.clone())
        .subtitle(|i: &CanvasItem| i.item_type.label().to_owned())
        .body(|i: &CanvasItem| i.description.clone().unwrap_or_default())
        .badges(|i: &CanvasItem| i.tags.clone())
}

/// Items laid out on the blocks of `kind`; items of other types are unplaced.
pub(crate) fn view_configs(kind: CanvasKind) -> ViewConfigs<CanvasItem> {
    let blocks = kind.blocks().iter().map(|b| CanvasBlockDef::new(b.key, b.label)).collect();
    ViewConfigs::default()
        .with_table(TableConfig::new(vec![
            Column::new("title", "Title", |i: &CanvasItem| i.title.clone()),
            Column::new("item_type", "Type", |i: &CanvasItem| i.item_type.label().to_owned()),
            Column::new("tags", "Tags", |i: &CanvasItem| i.tags.join(", ")),
            Column::new("updated_at", "Updated", |i: &CanvasItem| i.updated_at.clone()),
        ]))
        .with_grid(card())
        .with_canvas(CanvasConfig::new(
            blocks,
            move |i: &CanvasItem| kind.block_for(i.item_type).map(|b| b.key.to_owned()),
            card(),
        ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub item_type: Option<ItemType>,
}

/// `GET /api/canvas-items?item_type=`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CanvasItem>>, ApiError> {
    Ok(Json(canvas_item::list(&state.pool, query.item_type).await?))
}

/// `GET /api/canvas-items/:id`
pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CanvasItem>, ApiError> {
    Ok(Json(canvas_item::get(&state.pool, id).await?))
}

/// `POST /api/canvas-items`
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CanvasItemInput>,
) -> Result<(StatusCode, Json<CanvasItem>), ApiError> {
    let item = canvas_item::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `PUT /api/canvas-items/:id`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CanvasItemInput>,
) -> Result<Json<CanvasItem>, ApiError> {
    Ok(Json(canvas_item::update(&state.pool, id, &input).await?))
}

/// `DELETE /api/canvas-items/:id`
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    canvas_item::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemViewQuery {
    pub view: Option<String>,
    /// Canvas layout used by the canvas view; business model by default.
    pub kind: Option<String>,
}

/// `GET /api/canvas-items/view?view=&kind=`
pub async fn view(
    State(state): State<AppState>,
    Query(query): Query<ItemViewQuery>,
) -> Result<Json<DataViewModel>, ApiError> {
    let requested = query.view.as_deref().map(parse_view).transpose()?;
    let kind = match query.kind.as_deref() {
        None => CanvasKind::BusinessModel,
        Some(raw) => CanvasKind::from_str(raw).ok_or_else(|| ApiError::bad_request(format!("unknown canvas kind: {raw}")))?,
    };

    let data_view = DataView::new(view_configs(kind))
        .with_empty_state(EmptyState::new("No canvas items yet", "Create an item to place it on a canvas."));
    let mut switcher = data_view
        .mount_switcher(VIEW_KEY, ViewType::Grid, state.preferences.clone())
        .await?;
    if let Some(view) = requested {
        switcher.switch_to(view).await?;
    }

    let rows = canvas_item::list(&state.pool, None).await?;
    let model = state.boundaries.with(VIEW_KEY, |boundary| data_view.present_with(&rows, &switcher, boundary));
    Ok(Json(model))
}
