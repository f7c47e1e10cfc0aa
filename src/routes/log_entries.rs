//! Log entry routes: CRUD, the multi-view list, and kanban moves.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::views::parse_view;
use crate::error::ApiError;
use crate::services::log_entry::{self, LogEntry, LogEntryInput, LogStatus, StatusMover};
use crate::state::AppState;
use crate::views::ViewType;
use crate::views::config::{CardConfig, Column, KanbanConfig, KanbanGroup, TableConfig, ViewConfigs};
use crate::views::data_view::{DataView, DataViewModel, EmptyState};
use crate::views::kanban::{self, Announcement, DropTarget, KanbanModel, MoveStatus};

/// Preference key for the list page's view switcher.
pub const VIEW_KEY: &str = "log-entries";

fn card() -> CardConfig<LogEntry> {
    CardConfig::new(|e: &LogEntry| e.title.clone())
        .subtitle(|e: &LogEntry| e.entry_date.clone())
        .body(|e: &LogEntry| e.summary.clone().unwrap_or_default())
        .badges(|e: &LogEntry| e.tags.clone())
}

fn status_color(status: LogStatus) -> &'static str {
    match status {
        LogStatus::Draft => "#9ca3af",
        LogStatus::Published => "#10b981",
        LogStatus::Archived => "#64748b",
    }
}

/// Board columns, one per status.
pub(crate) fn board_config() -> KanbanConfig<LogEntry> {
    let groups = LogStatus::ALL
        .iter()
        .map(|s| {
            let label = match s {
                LogStatus::Draft => "Draft",
                LogStatus::Published => "Published",
                LogStatus::Archived => "Archived",
            };
            KanbanGroup::new(s.as_str(), label, status_color(*s))
        })
        .collect();
    KanbanConfig::new(groups, |e: &LogEntry| e.status.as_str().to_owned(), card())
}

pub(crate) fn view_configs() -> ViewConfigs<LogEntry> {
    ViewConfigs::default()
        .with_table(TableConfig::new(vec![
            Column::new("title", "Title", |e: &LogEntry| e.title.clone()),
            Column::new("entry_date", "Date", |e: &LogEntry| e.entry_date.clone()),
            Column::new("status", "Status", |e: &LogEntry| e.status.to_string()),
            Column::new("tags", "Tags", |e: &LogEntry| e.tags.join(", ")),
        ]))
        .with_grid(card())
        .with_kanban(board_config())
}

// =============================================================================
// CRUD
// =============================================================================

/// `GET /api/log-entries`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<LogEntry>>, ApiError> {
    Ok(Json(log_entry::list(&state.pool).await?))
}

/// `GET /api/log-entries/:id`
pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<LogEntry>, ApiError> {
    Ok(Json(log_entry::get(&state.pool, id).await?))
}

/// `POST /api/log-entries`
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<LogEntryInput>,
) -> Result<(StatusCode, Json<LogEntry>), ApiError> {
    let entry = log_entry::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `PUT /api/log-entries/:id`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<LogEntryInput>,
) -> Result<Json<LogEntry>, ApiError> {
    Ok(Json(log_entry::update(&state.pool, id, &input).await?))
}

/// `DELETE /api/log-entries/:id`
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    log_entry::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// VIEWS
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub view: Option<String>,
}

/// `GET /api/log-entries/view?view=` renders the list with the active
/// view, switching (and persisting) first when `view` is given.
pub async fn view(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<DataViewModel>, ApiError> {
    let requested = query.view.as_deref().map(parse_view).transpose()?;

    let data_view = DataView::new(view_configs()).with_empty_state(
        EmptyState::new("No log entries yet", "Entries you write will show up here.").with_action("New entry"),
    );
    let mut switcher = data_view
        .mount_switcher(VIEW_KEY, ViewType::Table, state.preferences.clone())
        .await?;
    if let Some(view) = requested {
        switcher.switch_to(view).await?;
    }

    let rows = log_entry::list(&state.pool).await?;
    let model = state.boundaries.with(VIEW_KEY, |boundary| data_view.present_with(&rows, &switcher, boundary));
    Ok(Json(model))
}

#[derive(Debug, Deserialize)]
pub struct MoveBody {
    pub item_id: Uuid,
    pub target: DropTarget,
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    #[serde(flatten)]
    pub status: MoveStatus,
    pub announcement: Announcement,
    pub board: KanbanModel,
}

/// `POST /api/log-entries/board/move` drops a card onto a column or card.
///
/// The board in the response is always drawn from the rows the move
/// produced: the reloaded list on success, the unchanged list otherwise.
pub async fn move_card(
    State(state): State<AppState>,
    Json(body): Json<MoveBody>,
) -> Result<Json<MoveResponse>, ApiError> {
    let config = board_config();
    let rows = log_entry::list(&state.pool).await?;
    let mover = StatusMover::new(state.pool.clone());

    let result = kanban::drop_item(&config, &rows, body.item_id, &body.target, &mover).await;
    let board = kanban::render(&config, &result.items)?;

    Ok(Json(MoveResponse { status: result.status, announcement: result.announcement, board }))
}

#[cfg(test)]
#[path = "log_entries_test.rs"]
mod tests;
