use super::*;

#[test]
fn validate_requires_title() {
    let errors = CanvasItemInput::new("   ", ItemType::Channel).validate().unwrap_err();
    assert_eq!(errors.get("title"), Some("is required"));
    assert!(CanvasItemInput::new("Newsletter", ItemType::Channel).validate().is_ok());
}

#[test]
fn input_rejects_unknown_item_type() {
    let ok: CanvasItemInput = serde_json::from_str(r#"{"title":"SMBs","item_type":"segment"}"#).unwrap();
    assert_eq!(ok.item_type, ItemType::Segment);
    assert!(serde_json::from_str::<CanvasItemInput>(r#"{"title":"x","item_type":"widget"}"#).is_err());
}

#[test]
fn every_item_type_has_a_label() {
    for item_type in ItemType::ALL {
        assert!(!item_type.label().is_empty());
    }
    assert_eq!(ItemType::ALL.len(), 15);
}

#[test]
fn escape_like_neutralizes_wildcards() {
    assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    assert_eq!(escape_like("plain"), "plain");
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn search_filters_by_type_and_excludes_linked() {
    let pool = crate::state::test_helpers::integration_pool().await;

    let smb = create(&pool, &CanvasItemInput::new("Budget-conscious SMBs", ItemType::Segment)).await.unwrap();
    let ent = create(&pool, &CanvasItemInput::new("Enterprise buyers", ItemType::Segment)).await.unwrap();
    create(&pool, &CanvasItemInput::new("SMB newsletter", ItemType::Channel)).await.unwrap();

    let hits = search(&pool, "smb", &[ItemType::Segment], &[], 20).await.unwrap();
    assert_eq!(hits.iter().map(|i| i.id).collect::<Vec<_>>(), vec![smb.id]);

    let hits = search(&pool, "", &[ItemType::Segment], &[smb.id], 20).await.unwrap();
    assert_eq!(hits.iter().map(|i| i.id).collect::<Vec<_>>(), vec![ent.id]);

    let ordered = get_many(&pool, &[ent.id, smb.id]).await.unwrap();
    assert_eq!(ordered[0].id, ent.id);
    assert_eq!(ordered[1].id, smb.id);
}
