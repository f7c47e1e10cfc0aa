//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the database pool, the optional AI client, the view preference
//! store shared by every switcher, the per-page error boundaries, and the
//! in-flight guards used by the canvas linkers and placement sync.

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::ai::AiGenerate;
use crate::services::guard::InFlight;
use crate::views::boundary::Boundaries;
use crate::views::preference::PreferenceStore;

/// Clone is required by Axum; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// `None` when no AI endpoint is configured.
    pub ai: Option<Arc<dyn AiGenerate>>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub guards: InFlight,
    pub boundaries: Boundaries,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, ai: Option<Arc<dyn AiGenerate>>, preferences: Arc<dyn PreferenceStore>) -> Self {
        Self { pool, ai, preferences, guards: InFlight::new(), boundaries: Boundaries::new() }
    }

    #[must_use]
    pub fn ai(&self) -> Option<&dyn AiGenerate> {
        self.ai.as_deref()
    }
}

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;
