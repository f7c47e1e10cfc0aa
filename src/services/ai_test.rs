use std::sync::Mutex;

use serde_json::json;

use super::*;

/// Replays canned results and records the actions it was asked for.
struct MockAi {
    reply: Mutex<Option<Result<Value, AiError>>>,
    calls: Mutex<Vec<AiAction>>,
}

impl MockAi {
    fn answering(reply: Result<Value, AiError>) -> Self {
        Self { reply: Mutex::new(Some(reply)), calls: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl AiGenerate for MockAi {
    async fn generate(&self, action: AiAction, _input: &Value) -> Result<Value, AiError> {
        self.calls.lock().unwrap().push(action);
        self.reply.lock().unwrap().take().unwrap_or(Err(AiError::Request("no reply queued".into())))
    }
}

#[test]
fn request_serializes_action_and_input() {
    let request = AiRequest { action: AiAction::GenerateSummary, input: json!({"content": "hi"}) };
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({"action": "generate_summary", "input": {"content": "hi"}})
    );
}

#[test]
fn response_envelope_omits_absent_fields() {
    assert_eq!(serde_json::to_value(AiResponse::ok(json!("x"))).unwrap(), json!({"success": true, "data": "x"}));
    assert_eq!(
        serde_json::to_value(AiResponse::failure("nope")).unwrap(),
        json!({"success": false, "error": "nope"})
    );
}

#[test]
fn parse_response_handles_success_failure_and_garbage() {
    assert_eq!(parse_response(r#"{"success":true,"data":{"text":"T"}}"#).unwrap(), json!({"text": "T"}));
    assert_eq!(parse_response(r#"{"success":true}"#).unwrap(), Value::Null);

    let rejected = parse_response(r#"{"success":false,"error":"quota"}"#).unwrap_err();
    assert!(matches!(rejected, AiError::Rejected(ref m) if m == "quota"));
    assert!(!rejected.retryable());

    assert!(matches!(parse_response("<html>"), Err(AiError::Parse(_))));
}

#[test]
fn status_errors_retry_only_on_server_side_failures() {
    assert!(AiError::Status { status: 503, body: String::new() }.retryable());
    assert!(AiError::Status { status: 429, body: String::new() }.retryable());
    assert!(!AiError::Status { status: 400, body: String::new() }.retryable());
    assert_eq!(AiError::Disabled.error_code(), "E_AI_DISABLED");
}

#[tokio::test]
async fn run_without_client_reports_disabled() {
    let request = AiRequest { action: AiAction::GenerateTitle, input: Value::Null };
    let response = run(None, &request).await;
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("AI assistance is not configured"));
}

#[tokio::test]
async fn run_wraps_data_and_errors() {
    let ok = MockAi::answering(Ok(json!("Week 12: shipping")));
    let request = AiRequest { action: AiAction::GenerateTitle, input: json!({"content": "..."}) };
    assert_eq!(run(Some(&ok), &request).await, AiResponse::ok(json!("Week 12: shipping")));

    let failing = MockAi::answering(Err(AiError::Status { status: 502, body: "bad gateway".into() }));
    let response = run(Some(&failing), &request).await;
    assert!(!response.success);
    assert!(response.error.unwrap().contains("502"));
}

#[test]
fn action_for_maps_form_fields() {
    assert_eq!(action_for("log_entry", "title"), Some(AiAction::GenerateTitle));
    assert_eq!(action_for("log_entry", "summary"), Some(AiAction::GenerateSummary));
    assert_eq!(action_for("verbivore_entry", "excerpt"), Some(AiAction::GenerateSummary));
    assert_eq!(action_for("verbivore_term", "definition"), Some(AiAction::GenerateDefinition));
    assert_eq!(action_for("verbivore_entry", "content"), Some(AiAction::RewriteDraft));
    assert_eq!(action_for("canvas_item", "title"), None);
}

#[tokio::test]
async fn suggest_field_accepts_string_or_text_object() {
    let plain = MockAi::answering(Ok(json!("  A neat title  ")));
    assert_eq!(suggest_field(Some(&plain), "log_entry", "title", &Value::Null).await.as_deref(), Some("A neat title"));

    let wrapped = MockAi::answering(Ok(json!({"text": "A definition"})));
    assert_eq!(
        suggest_field(Some(&wrapped), "verbivore_term", "definition", &Value::Null).await.as_deref(),
        Some("A definition")
    );
    assert_eq!(*wrapped.calls.lock().unwrap(), vec![AiAction::GenerateDefinition]);
}

#[tokio::test]
async fn suggest_field_is_best_effort() {
    let blank = MockAi::answering(Ok(json!("   ")));
    assert_eq!(suggest_field(Some(&blank), "log_entry", "title", &Value::Null).await, None);

    let failing = MockAi::answering(Err(AiError::Request("timeout".into())));
    assert_eq!(suggest_field(Some(&failing), "log_entry", "title", &Value::Null).await, None);

    let unused = MockAi::answering(Ok(json!("x")));
    assert_eq!(suggest_field(Some(&unused), "story_map", "title", &Value::Null).await, None);
    assert!(unused.calls.lock().unwrap().is_empty(), "unmapped field never calls out");

    assert_eq!(suggest_field(None, "log_entry", "title", &Value::Null).await, None);
}

#[tokio::test]
async fn extract_terms_dedupes_and_tolerates_shapes() {
    let list = MockAi::answering(Ok(json!(["Brunch", " smog ", "brunch", "", 7])));
    assert_eq!(extract_terms(Some(&list), "text").await, vec!["Brunch".to_string(), "smog".to_string()]);

    let wrapped = MockAi::answering(Ok(json!({"terms": ["Motel"]})));
    assert_eq!(extract_terms(Some(&wrapped), "text").await, vec!["Motel".to_string()]);

    let odd = MockAi::answering(Ok(json!(42)));
    assert!(extract_terms(Some(&odd), "text").await.is_empty());

    assert!(extract_terms(None, "text").await.is_empty());
}
