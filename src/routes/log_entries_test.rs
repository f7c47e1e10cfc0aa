use serde_json::json;

use super::*;
use crate::routes::app;
use crate::state::test_helpers::{self, call, json_request};

fn entry(title: &str, status: LogStatus) -> LogEntry {
    LogEntry {
        id: Uuid::new_v4(),
        title: title.into(),
        slug: title.to_lowercase().replace(' ', "-"),
        summary: Some("short".into()),
        content: String::new(),
        entry_date: "2024-03-18".into(),
        status,
        tags: vec!["ops".into()],
        cover_url: None,
        updated_at: "2024-03-18T10:00:00Z".into(),
    }
}

#[test]
fn list_page_offers_table_grid_and_board() {
    assert_eq!(view_configs().available(), vec![ViewType::Table, ViewType::Grid, ViewType::Kanban]);
}

#[test]
fn board_has_one_column_per_status() {
    let config = board_config();
    let ids: Vec<&str> = config.groups.iter().map(|g| g.id.as_str()).collect();
    assert_eq!(ids, ["draft", "published", "archived"]);
    assert_eq!(config.group_of(&entry("Week 1", LogStatus::Archived)), "archived");

    let board = kanban::render(&config, &[entry("Week 1", LogStatus::Draft), entry("Week 2", LogStatus::Draft)]).unwrap();
    assert_eq!(board.column("draft").unwrap().cards.len(), 2);
    assert!(board.column("published").unwrap().cards.is_empty());
}

#[test]
fn move_body_accepts_column_and_card_targets() {
    let id = Uuid::new_v4();
    let body: MoveBody = serde_json::from_value(json!({"item_id": id, "target": {"column": "published"}})).unwrap();
    assert_eq!(body.target, DropTarget::Column("published".into()));

    let other = Uuid::new_v4();
    let body: MoveBody = serde_json::from_value(json!({"item_id": id, "target": {"item": other}})).unwrap();
    assert_eq!(body.target, DropTarget::Item(other));
}

#[test]
fn move_response_flattens_status() {
    let response = MoveResponse {
        status: MoveStatus::Moved { from: "draft".into(), to: "published".into() },
        announcement: Announcement { politeness: kanban::Politeness::Polite, message: "Moved.".into() },
        board: kanban::render(&board_config(), &[]).unwrap(),
    };
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["status"], "moved");
    assert_eq!(value["to"], "published");
    assert_eq!(value["announcement"]["politeness"], "polite");
    assert_eq!(value["board"]["columns"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn create_rejects_invalid_input_before_touching_the_database() {
    let app = app(test_helpers::test_app_state());
    let body = json!({"title": "  ", "entry_date": "18/03/2024"});
    let (status, value) = call(app, json_request("POST", "/api/log-entries", Some(body))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(value["code"], "E_VALIDATION");
    assert_eq!(value["fields"]["title"], "is required");
    assert!(value["fields"]["entry_date"].is_string());
}

#[tokio::test]
async fn view_rejects_unknown_and_unconfigured_views() {
    let state = test_helpers::test_app_state();

    let (status, value) = call(app(state.clone()), json_request("GET", "/api/log-entries/view?view=timeline", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["code"], "E_BAD_REQUEST");

    let (status, value) = call(app(state.clone()), json_request("GET", "/api/log-entries/view?view=canvas", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["code"], "E_VIEW_UNAVAILABLE");
    assert_eq!(state.preferences.get(VIEW_KEY).await, None);
}

#[tokio::test]
async fn view_switch_persists_even_when_rows_cannot_load() {
    let state = test_helpers::test_app_state();
    let (status, _) = call(app(state.clone()), json_request("GET", "/api/log-entries/view?view=kanban", None)).await;

    assert!(status.is_server_error());
    assert_eq!(state.preferences.get(VIEW_KEY).await, Some(ViewType::Kanban));
}
