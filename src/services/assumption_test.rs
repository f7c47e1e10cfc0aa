use super::*;

#[test]
fn validate_requires_statement() {
    let errors = AssumptionInput::new("").validate().unwrap_err();
    assert_eq!(errors.get("statement"), Some("is required"));
    assert!(AssumptionInput::new("SMBs will pay monthly").validate().is_ok());
}

#[test]
fn omitted_enums_fall_back_to_column_defaults() {
    let input: AssumptionInput = serde_json::from_str(r#"{"statement":"s"}"#).unwrap();
    assert_eq!(input.category(), Category::Desirability);
    assert_eq!(input.importance(), Importance::Medium);
    assert_eq!(input.evidence(), Evidence::None);
    assert_eq!(input.validation_status(), ValidationStatus::Untested);
}

#[test]
fn explicit_enums_are_kept() {
    let input: AssumptionInput = serde_json::from_str(
        r#"{"statement":"s","category":"viability","importance":"critical","evidence":"strong","validation_status":"validated"}"#,
    )
    .unwrap();
    assert_eq!(input.category(), Category::Viability);
    assert_eq!(input.importance(), Importance::Critical);
    assert_eq!(input.evidence(), Evidence::Strong);
    assert_eq!(input.validation_status(), ValidationStatus::Validated);
}

#[test]
fn unknown_enum_text_is_rejected() {
    assert!(serde_json::from_str::<AssumptionInput>(r#"{"statement":"s","importance":"urgent"}"#).is_err());
    assert!(Category::try_from("vibes".to_string()).is_err());
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn assumption_crud_round_trip() {
    let pool = crate::state::test_helpers::integration_pool().await;

    let created = create(&pool, &AssumptionInput::new("SMBs will pay monthly")).await.unwrap();
    assert_eq!(created.validation_status, ValidationStatus::Untested);

    let mut edit = AssumptionInput::new("SMBs will pay annually");
    edit.validation_status = Some(ValidationStatus::Testing);
    let updated = update(&pool, created.id, &edit).await.unwrap();
    assert_eq!(updated.statement, "SMBs will pay annually");
    assert_eq!(updated.validation_status, ValidationStatus::Testing);

    let found = search(&pool, "ANNUAL", Category::ALL, &[], 10).await.unwrap();
    assert_eq!(found.len(), 1);

    delete(&pool, created.id).await.unwrap();
    assert!(matches!(get(&pool, created.id).await, Err(ContentError::NotFound { .. })));
}
