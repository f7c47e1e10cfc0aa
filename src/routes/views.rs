//! View preference routes.
//!
//! Pages that render their own lists use these endpoints to read and write
//! the active view for a persistence key. Every successful write is
//! broadcast on `/api/views/events` so other open pages follow along.
//! `/api/views/:key/reset` is the fallback's "Try again": it clears one
//! tripped boundary slot for the page, and the next render tries again.

use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::AppState;
use crate::views::switcher::{SwitcherError, SwitcherSnapshot, ViewSwitcher};
use crate::views::{ViewType, parse_view_list};

const CHANGE_EVENT: &str = "view-preference";

/// Parse one view name from a query string or body.
pub(crate) fn parse_view(raw: &str) -> Result<ViewType, ApiError> {
    ViewType::from_str(raw.trim()).ok_or_else(|| ApiError::bad_request(format!("unknown view: {raw}")))
}

async fn mount(
    state: &AppState,
    key: &str,
    available: Vec<ViewType>,
    default: Option<ViewType>,
) -> Result<ViewSwitcher, ApiError> {
    let Some(&first) = available.first() else {
        return Err(SwitcherError::NoViews.into());
    };
    let default = default.unwrap_or(first);
    Ok(ViewSwitcher::mount(key, available, default, state.preferences.clone()).await?)
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    /// Comma-separated, e.g. `table,grid`. All views when omitted.
    pub available: Option<String>,
    pub default: Option<String>,
}

/// `GET /api/views/:key` resolves the active view for `key`.
pub async fn get_view(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<SwitcherSnapshot>, ApiError> {
    let available = query.available.as_deref().map_or_else(|| ViewType::ALL.to_vec(), parse_view_list);
    let default = query.default.as_deref().map(parse_view).transpose()?;
    let switcher = mount(&state, &key, available, default).await?;
    Ok(Json(switcher.snapshot()))
}

#[derive(Debug, Deserialize)]
pub struct PutViewBody {
    pub view: ViewType,
    pub available: Option<Vec<ViewType>>,
    pub default: Option<ViewType>,
}

/// `PUT /api/views/:key` switches and persists.
pub async fn put_view(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<PutViewBody>,
) -> Result<Json<SwitcherSnapshot>, ApiError> {
    let available = body.available.unwrap_or_else(|| ViewType::ALL.to_vec());
    let mut switcher = mount(&state, &key, available, body.default).await?;
    switcher.switch_to(body.view).await?;
    Ok(Json(switcher.snapshot()))
}

#[derive(Debug, Deserialize)]
pub struct ResetBody {
    pub view: ViewType,
}

/// `POST /api/views/:key/reset` clears the page's boundary slot for `view`.
pub async fn reset_view(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<ResetBody>,
) -> StatusCode {
    state.boundaries.reset(&key, body.view);
    info!(%key, view = %body.view, "view boundary reset");
    StatusCode::NO_CONTENT
}

/// `GET /api/views/events` streams preference changes as SSE.
pub async fn events(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.preferences.subscribe();
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(change) => match Event::default().event(CHANGE_EVENT).json_data(&change) {
                    Ok(event) => return Some((Ok(event), rx)),
                    Err(e) => warn!(key = %change.key, error = %e, "view change could not be encoded"),
                },
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "view event subscriber lagged"),
                Err(RecvError::Closed) => return None,
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
#[path = "views_test.rs"]
mod tests;
