use super::*;

#[test]
fn business_model_canvas_has_nine_blocks_in_order() {
    let keys: Vec<&str> = CanvasKind::BusinessModel.blocks().iter().map(|b| b.key).collect();
    assert_eq!(
        keys,
        [
            "key_partners",
            "key_activities",
            "key_resources",
            "value_propositions",
            "customer_relationships",
            "channels",
            "customer_segments",
            "cost_structure",
            "revenue_streams",
        ]
    );
}

#[test]
fn value_map_and_customer_profile_blocks() {
    let vm: Vec<&str> = CanvasKind::ValueMap.blocks().iter().map(|b| b.key).collect();
    assert_eq!(vm, ["products_services", "pain_relievers", "gain_creators"]);
    let cp: Vec<&str> = CanvasKind::CustomerProfile.blocks().iter().map(|b| b.key).collect();
    assert_eq!(cp, ["customer_jobs", "pains", "gains"]);
}

#[test]
fn every_item_type_has_exactly_one_home_block() {
    for item_type in ItemType::ALL {
        let homes: Vec<_> = CanvasKind::ALL.iter().filter_map(|k| k.block_for(*item_type)).collect();
        assert_eq!(homes.len(), 1, "{item_type} should live in one block");
    }
}

#[test]
fn block_lookup_and_allowed_types() {
    let segments = CanvasKind::BusinessModel.block("customer_segments").expect("block");
    assert_eq!(segments.allowed, &[ItemType::Segment]);
    assert!(CanvasKind::BusinessModel.block("pains").is_none());
    assert_eq!(CanvasKind::CustomerProfile.block_for(ItemType::Pain).map(|b| b.key), Some("pains"));
}

#[test]
fn kind_tables_and_text() {
    assert_eq!(CanvasKind::from_str("value_map"), Some(CanvasKind::ValueMap));
    assert_eq!(CanvasKind::ValueMap.table(), "value_maps");
    assert_eq!(CanvasRef::new(CanvasKind::CustomerProfile, Uuid::nil()).to_string(), format!("customer_profile:{}", Uuid::nil()));
}

#[test]
fn canvas_input_requires_name() {
    let input = CanvasInput { name: " ".into(), description: None };
    assert_eq!(input.validate().unwrap_err().get("name"), Some("is required"));
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn layout_returns_empty_blocks_for_new_canvas() {
    let pool = crate::state::test_helpers::integration_pool().await;
    let created = create(&pool, CanvasKind::ValueMap, &CanvasInput { name: "Studio VM".into(), description: None })
        .await
        .unwrap();
    let canvas = CanvasRef::new(CanvasKind::ValueMap, created.id);
    let layout = layout(&pool, canvas).await.unwrap();
    assert_eq!(layout.blocks.len(), 3);
    assert!(layout.blocks.iter().all(|b| b.items.is_empty() && b.assumptions.is_empty()));

    delete(&pool, canvas).await.unwrap();
    assert!(matches!(get(&pool, canvas).await, Err(ContentError::NotFound { .. })));
}
