//! AI assistance routes.
//!
//! Both endpoints always answer 200: generation failures are part of the
//! response body, never an HTTP error, so form pages can ignore them.

use axum::extract::State;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::ai::{self, AiRequest, AiResponse};
use crate::state::AppState;

/// `POST /api/ai/generate` proxies `{action, input}` to the endpoint.
pub async fn generate(State(state): State<AppState>, Json(request): Json<AiRequest>) -> Json<AiResponse> {
    Json(ai::run(state.ai(), &request).await)
}

#[derive(Debug, Deserialize)]
pub struct SuggestBody {
    pub entity: String,
    pub field: String,
    #[serde(default)]
    pub input: Value,
}

#[derive(Debug, Serialize)]
pub struct Suggestion {
    pub suggestion: Option<String>,
}

/// `POST /api/ai/suggest` fills one form field, when it can.
pub async fn suggest(State(state): State<AppState>, Json(body): Json<SuggestBody>) -> Json<Suggestion> {
    let suggestion = ai::suggest_field(state.ai(), &body.entity, &body.field, &body.input).await;
    Json(Suggestion { suggestion })
}

#[cfg(test)]
#[path = "ai_test.rs"]
mod tests;
