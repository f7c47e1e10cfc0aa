//! AI assistance: a thin client for the generation endpoint.
//!
//! DESIGN
//! ======
//! The endpoint takes `{action, input}` and answers `{success, data | error}`.
//! Everything here is best-effort: form helpers return `None` (or an empty
//! list) when the endpoint is disabled, slow, or unhappy, and log a warning.
//! Saving content never depends on a suggestion arriving.
//!
//! [`AiGenerate`] is the seam the routes depend on so tests can swap in a
//! canned responder instead of a live endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::fields::text_enum;
use crate::config::AiEndpointConfig;
use crate::error::ErrorCode;

text_enum! {
    AiAction {
        GenerateTitle => "generate_title",
        GenerateSummary => "generate_summary",
        GenerateDefinition => "generate_definition",
        ExtractTerms => "extract_terms",
        RewriteDraft => "rewrite_draft",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRequest {
    pub action: AiAction,
    #[serde(default)]
    pub input: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AiResponse {
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(message.into()) }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI assistance is not configured")]
    Disabled,
    #[error("AI request failed: {0}")]
    Request(String),
    #[error("AI endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("AI response could not be parsed: {0}")]
    Parse(String),
    #[error("AI endpoint declined: {0}")]
    Rejected(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for AiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Disabled => "E_AI_DISABLED",
            Self::Request(_) => "E_AI_REQUEST",
            Self::Status { .. } => "E_AI_STATUS",
            Self::Parse(_) => "E_AI_PARSE",
            Self::Rejected(_) => "E_AI_REJECTED",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Run one generation action.
#[async_trait]
pub trait AiGenerate: Send + Sync {
    /// # Errors
    ///
    /// Returns an [`AiError`] if the endpoint cannot be reached, answers
    /// with a non-200 status, or reports `success: false`.
    async fn generate(&self, action: AiAction, input: &Value) -> Result<Value, AiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct AiClient {
    http: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl AiClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AiEndpointConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| AiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, url: config.url.clone(), token: config.token.clone() })
    }
}

#[async_trait]
impl AiGenerate for AiClient {
    async fn generate(&self, action: AiAction, input: &Value) -> Result<Value, AiError> {
        let body = AiRequest { action, input: input.clone() };
        let mut request = self.http.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|e| AiError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| AiError::Request(e.to_string()))?;
        if status != 200 {
            return Err(AiError::Status { status, body: text });
        }
        parse_response(&text)
    }
}

/// Decode an endpoint reply into its `data` payload.
///
/// # Errors
///
/// `Parse` for malformed JSON, `Rejected` when `success` is false.
pub fn parse_response(text: &str) -> Result<Value, AiError> {
    let reply: AiResponse = serde_json::from_str(text).map_err(|e| AiError::Parse(e.to_string()))?;
    if !reply.success {
        return Err(AiError::Rejected(reply.error.unwrap_or_else(|| "unknown error".into())));
    }
    Ok(reply.data.unwrap_or(Value::Null))
}

// =============================================================================
// BEST-EFFORT HELPERS
// =============================================================================

/// Proxy a raw request, folding every failure into the response envelope.
pub async fn run(ai: Option<&dyn AiGenerate>, request: &AiRequest) -> AiResponse {
    let Some(ai) = ai else {
        return AiResponse::failure(AiError::Disabled.to_string());
    };
    match ai.generate(request.action, &request.input).await {
        Ok(data) => {
            info!(action = %request.action, "ai generation succeeded");
            AiResponse::ok(data)
        }
        Err(e) => {
            warn!(action = %request.action, error = %e, "ai generation failed");
            AiResponse::failure(e.to_string())
        }
    }
}

/// The action that fills `field` on an `entity` form, if any.
#[must_use]
pub fn action_for(entity: &str, field: &str) -> Option<AiAction> {
    match (entity, field) {
        ("log_entry" | "verbivore_entry", "title") => Some(AiAction::GenerateTitle),
        ("log_entry", "summary") | ("verbivore_entry", "excerpt") => Some(AiAction::GenerateSummary),
        ("verbivore_term", "definition") => Some(AiAction::GenerateDefinition),
        ("log_entry" | "verbivore_entry", "content") => Some(AiAction::RewriteDraft),
        _ => None,
    }
}

/// Ask for a value for one form field. `None` when there is nothing usable.
pub async fn suggest_field(ai: Option<&dyn AiGenerate>, entity: &str, field: &str, input: &Value) -> Option<String> {
    let action = action_for(entity, field)?;
    let ai = ai?;
    match ai.generate(action, input).await {
        Ok(data) => text_of(&data),
        Err(e) => {
            warn!(entity, field, action = %action, error = %e, "field suggestion failed");
            None
        }
    }
}

/// Candidate glossary terms found in `content`; empty on any failure.
pub async fn extract_terms(ai: Option<&dyn AiGenerate>, content: &str) -> Vec<String> {
    let Some(ai) = ai else {
        return Vec::new();
    };
    let input = serde_json::json!({ "content": content });
    match ai.generate(AiAction::ExtractTerms, &input).await {
        Ok(data) => terms_of(&data),
        Err(e) => {
            warn!(error = %e, "term extraction failed");
            Vec::new()
        }
    }
}

/// Accept a bare string or an object carrying `text`.
fn text_of(data: &Value) -> Option<String> {
    let text = match data {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("text")?.as_str()?,
        _ => return None,
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Accept `["a", "b"]` or `{"terms": ["a", "b"]}`; blanks and repeats are dropped.
fn terms_of(data: &Value) -> Vec<String> {
    let list = match data {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("terms") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    let mut terms: Vec<String> = Vec::new();
    for term in list.iter().filter_map(Value::as_str).map(str::trim).filter(|t| !t.is_empty()) {
        if !terms.iter().any(|t| t.eq_ignore_ascii_case(term)) {
            terms.push(term.to_owned());
        }
    }
    terms
}

#[cfg(test)]
#[path = "ai_test.rs"]
mod tests;
