//! Per-view error boundary.
//!
//! DESIGN
//! ======
//! Each rendered view runs inside a boundary slot keyed by view name. A
//! renderer that returns an error or panics trips its slot; a tripped slot
//! keeps serving the fallback until [`ErrorBoundary::reset`] is called.
//! Resetting only clears boundary state. It never refetches data, so a
//! deterministic fault trips the slot again on the next render.
//!
//! Pages are rendered per request, so their boundaries live in
//! [`Boundaries`], one per page key, and outlast any single render.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::warn;

use super::ViewType;

pub const RETRY_LABEL: &str = "Try again";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("view misconfigured: {0}")]
    Misconfigured(String),
    #[error("row could not be rendered: {0}")]
    Row(String),
    #[error("renderer panicked: {0}")]
    Panicked(String),
}

impl crate::error::ErrorCode for RenderError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Misconfigured(_) => "E_VIEW_MISCONFIGURED",
            Self::Row(_) => "E_VIEW_ROW",
            Self::Panicked(_) => "E_VIEW_PANICKED",
        }
    }
}

/// Fallback shown in place of a faulted view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fallback {
    pub view: ViewType,
    pub message: String,
    pub retry_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryOutcome<M> {
    Rendered(M),
    Fallback(Fallback),
}

#[derive(Debug, Default)]
pub struct ErrorBoundary {
    tripped: HashMap<ViewType, RenderError>,
}

impl ErrorBoundary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `render` for `view` unless that slot is already tripped.
    pub fn run<M>(&mut self, view: ViewType, render: impl FnOnce() -> Result<M, RenderError>) -> BoundaryOutcome<M> {
        if let Some(err) = self.tripped.get(&view) {
            return BoundaryOutcome::Fallback(fallback(view, err));
        }

        let result = match catch_unwind(AssertUnwindSafe(render)) {
            Ok(result) => result,
            Err(payload) => Err(RenderError::Panicked(panic_message(payload.as_ref()))),
        };

        match result {
            Ok(model) => BoundaryOutcome::Rendered(model),
            Err(err) => {
                warn!(%view, error = %err, "view render failed; showing fallback");
                let out = fallback(view, &err);
                self.tripped.insert(view, err);
                BoundaryOutcome::Fallback(out)
            }
        }
    }

    #[must_use]
    pub fn is_tripped(&self, view: ViewType) -> bool {
        self.tripped.contains_key(&view)
    }

    /// Clear the slot for `view`; the next [`run`](Self::run) renders again.
    pub fn reset(&mut self, view: ViewType) {
        self.tripped.remove(&view);
    }
}

/// Boundaries shared across requests, keyed by page.
#[derive(Clone, Default)]
pub struct Boundaries {
    pages: Arc<Mutex<HashMap<String, ErrorBoundary>>>,
}

impl Boundaries {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with the boundary for `key`, creating it on first use.
    pub fn with<R>(&self, key: &str, f: impl FnOnce(&mut ErrorBoundary) -> R) -> R {
        let mut pages = self.pages.lock().unwrap_or_else(PoisonError::into_inner);
        f(pages.entry(key.to_owned()).or_default())
    }

    #[must_use]
    pub fn is_tripped(&self, key: &str, view: ViewType) -> bool {
        self.with(key, |boundary| boundary.is_tripped(view))
    }

    /// Clear one slot of `key`'s boundary.
    pub fn reset(&self, key: &str, view: ViewType) {
        self.with(key, |boundary| boundary.reset(view));
    }
}

fn fallback(view: ViewType, err: &RenderError) -> Fallback {
    Fallback { view, message: err.to_string(), retry_label: RETRY_LABEL }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
#[path = "boundary_test.rs"]
mod tests;
