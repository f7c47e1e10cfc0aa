//! Active-view selection for one list.
//!
//! DESIGN
//! ======
//! The switcher is mounted with the views a page configured, a default, and
//! a persistence key. It resolves the active view from the stored
//! preference, falling back to the default and then to the first available
//! view; any correction is written back immediately.
//!
//! View changes are two-phase: [`ViewSwitcher::begin_switch`] marks the
//! target pending (the toolbar shows a loading state), and
//! [`ViewSwitcher::commit`] yields to the scheduler before swapping so a
//! heavy re-render does not starve other work on the runtime.
//!
//! ERROR HANDLING
//! ==============
//! Preference writes are best-effort. Failures are logged and never change
//! the in-memory active view.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::ViewType;
use super::preference::{PreferenceChange, PreferenceStore};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwitcherError {
    #[error("no views are configured")]
    NoViews,
    #[error("view not available: {0}")]
    Unavailable(ViewType),
    #[error("no view change is pending")]
    NothingPending,
}

impl crate::error::ErrorCode for SwitcherError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoViews => "E_NO_VIEWS",
            Self::Unavailable(_) => "E_VIEW_UNAVAILABLE",
            Self::NothingPending => "E_NOTHING_PENDING",
        }
    }
}

/// One toolbar control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolbarButton {
    pub view: ViewType,
    pub label: &'static str,
    pub aria_label: String,
    pub aria_pressed: bool,
    /// 1-based keyboard shortcut.
    pub shortcut: usize,
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitcherSnapshot {
    pub key: String,
    pub active: ViewType,
    pub available: Vec<ViewType>,
    pub pending: Option<ViewType>,
    pub toolbar: Vec<ToolbarButton>,
}

pub struct ViewSwitcher {
    key: String,
    available: Vec<ViewType>,
    active: ViewType,
    pending: Option<ViewType>,
    store: Arc<dyn PreferenceStore>,
}

impl ViewSwitcher {
    /// Resolve the active view for `key` and persist any correction.
    ///
    /// # Errors
    ///
    /// Returns [`SwitcherError::NoViews`] when `available` is empty.
    pub async fn mount(
        key: &str,
        available: Vec<ViewType>,
        default: ViewType,
        store: Arc<dyn PreferenceStore>,
    ) -> Result<Self, SwitcherError> {
        let first = *available.first().ok_or(SwitcherError::NoViews)?;
        let stored = store.get(key).await;

        let active = match stored {
            Some(view) if available.contains(&view) => view,
            _ if available.contains(&default) => default,
            _ => first,
        };

        let switcher = Self { key: key.to_owned(), available, active, pending: None, store };

        let default_missing = !switcher.available.contains(&default);
        let needs_correction = match stored {
            Some(view) => view != active,
            None => default_missing,
        };
        if needs_correction {
            debug!(key, ?stored, %default, %active, "correcting stored view preference");
            switcher.persist().await;
        }

        Ok(switcher)
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn active(&self) -> ViewType {
        self.active
    }

    #[must_use]
    pub fn available(&self) -> &[ViewType] {
        &self.available
    }

    #[must_use]
    pub fn pending(&self) -> Option<ViewType> {
        self.pending
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Mark `view` as the pending target.
    ///
    /// # Errors
    ///
    /// Returns [`SwitcherError::Unavailable`] if `view` is not configured.
    pub fn begin_switch(&mut self, view: ViewType) -> Result<(), SwitcherError> {
        if !self.available.contains(&view) {
            return Err(SwitcherError::Unavailable(view));
        }
        self.pending = Some(view);
        Ok(())
    }

    /// Yield, then make the pending view active and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`SwitcherError::NothingPending`] if no switch was begun.
    pub async fn commit(&mut self) -> Result<ViewType, SwitcherError> {
        if self.pending.is_none() {
            return Err(SwitcherError::NothingPending);
        }
        tokio::task::yield_now().await;
        let view = self.pending.take().ok_or(SwitcherError::NothingPending)?;
        self.active = view;
        self.persist().await;
        Ok(view)
    }

    /// User-initiated view change.
    ///
    /// # Errors
    ///
    /// Returns [`SwitcherError::Unavailable`] if `view` is not configured.
    pub async fn switch_to(&mut self, view: ViewType) -> Result<ViewType, SwitcherError> {
        self.begin_switch(view)?;
        self.commit().await
    }

    /// Apply a change written elsewhere for the same key. Does not persist.
    /// Returns `true` if the active view changed.
    pub fn apply_external(&mut self, change: &PreferenceChange) -> bool {
        if change.key != self.key || self.pending.is_some() || change.view == self.active {
            return false;
        }
        if !self.available.contains(&change.view) {
            return false;
        }
        self.active = change.view;
        true
    }

    #[must_use]
    pub fn toolbar(&self) -> Vec<ToolbarButton> {
        self.available
            .iter()
            .enumerate()
            .map(|(idx, view)| ToolbarButton {
                view: *view,
                label: view.label(),
                aria_label: format!("Switch to {} view", view.label().to_lowercase()),
                aria_pressed: *view == self.active,
                shortcut: idx + 1,
                busy: self.pending == Some(*view),
            })
            .collect()
    }

    #[must_use]
    pub fn snapshot(&self) -> SwitcherSnapshot {
        SwitcherSnapshot {
            key: self.key.clone(),
            active: self.active,
            available: self.available.clone(),
            pending: self.pending,
            toolbar: self.toolbar(),
        }
    }

    async fn persist(&self) {
        if let Err(e) = self.store.set(&self.key, self.active).await {
            warn!(key = %self.key, view = %self.active, error = %e, "failed to persist view preference");
        }
    }
}

#[cfg(test)]
#[path = "switcher_test.rs"]
mod tests;
