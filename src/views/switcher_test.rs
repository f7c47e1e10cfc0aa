use tokio::sync::broadcast;

use super::*;
use crate::views::preference::{MemoryPreferenceStore, PreferenceError};

/// Store whose writes always fail, mimicking a full or disabled storage.
struct BrokenStore {
    changes: broadcast::Sender<PreferenceChange>,
}

impl BrokenStore {
    fn new() -> Self {
        Self { changes: broadcast::channel(4).0 }
    }
}

#[async_trait::async_trait]
impl PreferenceStore for BrokenStore {
    async fn get(&self, _key: &str) -> Option<ViewType> {
        None
    }

    async fn set(&self, _key: &str, _view: ViewType) -> Result<(), PreferenceError> {
        Err(PreferenceError::Unavailable("quota exceeded".into()))
    }

    fn subscribe(&self) -> broadcast::Receiver<PreferenceChange> {
        self.changes.subscribe()
    }
}

fn memory() -> Arc<MemoryPreferenceStore> {
    Arc::new(MemoryPreferenceStore::new())
}

// =========================================================================
// mount / resolution
// =========================================================================

#[tokio::test]
async fn mount_uses_default_when_available() {
    let store = memory();
    let switcher = ViewSwitcher::mount("entries", vec![ViewType::Table, ViewType::Grid], ViewType::Grid, store.clone())
        .await
        .unwrap();
    assert_eq!(switcher.active(), ViewType::Grid);
    // Nothing to correct, nothing written.
    assert_eq!(store.get("entries").await, None);
}

#[tokio::test]
async fn mount_falls_back_to_first_and_corrects_preference() {
    let store = memory();
    let switcher = ViewSwitcher::mount("entries", vec![ViewType::Table], ViewType::Grid, store.clone())
        .await
        .unwrap();
    assert_eq!(switcher.active(), ViewType::Table);
    assert_eq!(store.get("entries").await, Some(ViewType::Table));
}

#[tokio::test]
async fn mount_prefers_stored_view() {
    let store = memory();
    store.set("entries", ViewType::Kanban).await.unwrap();
    let switcher = ViewSwitcher::mount(
        "entries",
        vec![ViewType::Table, ViewType::Kanban],
        ViewType::Table,
        store.clone(),
    )
    .await
    .unwrap();
    assert_eq!(switcher.active(), ViewType::Kanban);
}

#[tokio::test]
async fn mount_replaces_stale_stored_view_with_default() {
    let store = memory();
    store.set("entries", ViewType::Canvas).await.unwrap();
    let switcher = ViewSwitcher::mount("entries", vec![ViewType::Table, ViewType::Grid], ViewType::Grid, store.clone())
        .await
        .unwrap();
    assert_eq!(switcher.active(), ViewType::Grid);
    assert_eq!(store.get("entries").await, Some(ViewType::Grid));
}

#[tokio::test]
async fn mount_without_views_errors() {
    let result = ViewSwitcher::mount("entries", vec![], ViewType::Table, memory()).await;
    assert!(matches!(result, Err(SwitcherError::NoViews)));
}

#[tokio::test]
async fn resolution_holds_for_every_default() {
    let available = vec![ViewType::Grid, ViewType::Kanban];
    for default in ViewType::ALL {
        let store = memory();
        let switcher = ViewSwitcher::mount("k", available.clone(), default, store.clone()).await.unwrap();
        if available.contains(&default) {
            assert_eq!(switcher.active(), default);
        } else {
            assert_eq!(switcher.active(), ViewType::Grid);
            assert_eq!(store.get("k").await, Some(ViewType::Grid));
        }
    }
}

// =========================================================================
// switching
// =========================================================================

#[tokio::test]
async fn switch_persists_and_survives_remount() {
    let store = memory();
    let views = vec![ViewType::Table, ViewType::Grid, ViewType::Kanban];
    let mut first = ViewSwitcher::mount("assumptions", views.clone(), ViewType::Table, store.clone())
        .await
        .unwrap();
    first.switch_to(ViewType::Kanban).await.unwrap();

    let second = ViewSwitcher::mount("assumptions", views, ViewType::Table, store.clone()).await.unwrap();
    assert_eq!(second.active(), ViewType::Kanban);
}

#[tokio::test]
async fn switch_to_unavailable_view_is_rejected() {
    let mut switcher = ViewSwitcher::mount("k", vec![ViewType::Table], ViewType::Table, memory())
        .await
        .unwrap();
    let err = switcher.switch_to(ViewType::Canvas).await.unwrap_err();
    assert_eq!(err, SwitcherError::Unavailable(ViewType::Canvas));
    assert_eq!(switcher.active(), ViewType::Table);
}

#[tokio::test]
async fn pending_state_is_visible_until_commit() {
    let mut switcher = ViewSwitcher::mount("k", vec![ViewType::Table, ViewType::Grid], ViewType::Table, memory())
        .await
        .unwrap();
    switcher.begin_switch(ViewType::Grid).unwrap();
    assert!(switcher.is_pending());
    assert_eq!(switcher.active(), ViewType::Table);
    let grid_button = switcher.toolbar().into_iter().find(|b| b.view == ViewType::Grid).unwrap();
    assert!(grid_button.busy);

    assert_eq!(switcher.commit().await.unwrap(), ViewType::Grid);
    assert!(!switcher.is_pending());
    assert_eq!(switcher.active(), ViewType::Grid);
}

#[tokio::test]
async fn commit_without_pending_errors() {
    let mut switcher = ViewSwitcher::mount("k", vec![ViewType::Table], ViewType::Table, memory())
        .await
        .unwrap();
    assert_eq!(switcher.commit().await.unwrap_err(), SwitcherError::NothingPending);
}

#[tokio::test]
async fn persistence_failure_is_swallowed() {
    let store = Arc::new(BrokenStore::new());
    let mut switcher = ViewSwitcher::mount("k", vec![ViewType::Table, ViewType::Grid], ViewType::Canvas, store)
        .await
        .unwrap();
    assert_eq!(switcher.active(), ViewType::Table);
    assert_eq!(switcher.switch_to(ViewType::Grid).await.unwrap(), ViewType::Grid);
    assert_eq!(switcher.active(), ViewType::Grid);
}

// =========================================================================
// external changes / toolbar
// =========================================================================

#[tokio::test]
async fn apply_external_updates_matching_key_only() {
    let mut switcher = ViewSwitcher::mount("k", vec![ViewType::Table, ViewType::Grid], ViewType::Table, memory())
        .await
        .unwrap();

    assert!(!switcher.apply_external(&PreferenceChange { key: "other".into(), view: ViewType::Grid }));
    assert!(!switcher.apply_external(&PreferenceChange { key: "k".into(), view: ViewType::Canvas }));
    assert!(switcher.apply_external(&PreferenceChange { key: "k".into(), view: ViewType::Grid }));
    assert_eq!(switcher.active(), ViewType::Grid);
}

#[tokio::test]
async fn external_change_from_another_switcher_is_received() {
    let store = memory();
    let views = vec![ViewType::Table, ViewType::Grid];
    let mut rx = store.subscribe();
    let mut other = ViewSwitcher::mount("k", views.clone(), ViewType::Table, store.clone()).await.unwrap();
    let mut mine = ViewSwitcher::mount("k", views, ViewType::Table, store.clone()).await.unwrap();

    other.switch_to(ViewType::Grid).await.unwrap();
    let change = rx.recv().await.unwrap();
    assert!(mine.apply_external(&change));
    assert_eq!(mine.active(), ViewType::Grid);
}

#[tokio::test]
async fn toolbar_marks_active_view_and_shortcuts() {
    let switcher = ViewSwitcher::mount(
        "k",
        vec![ViewType::Table, ViewType::Kanban],
        ViewType::Kanban,
        memory(),
    )
    .await
    .unwrap();
    let toolbar = switcher.toolbar();
    assert_eq!(toolbar.len(), 2);
    assert_eq!(toolbar[0].shortcut, 1);
    assert!(!toolbar[0].aria_pressed);
    assert!(toolbar[1].aria_pressed);
    assert_eq!(toolbar[1].aria_label, "Switch to board view");
}
