use super::*;

struct Row {
    id: Uuid,
    title: String,
    stage: String,
}

impl RowId for Row {
    fn row_id(&self) -> Uuid {
        self.id
    }
}

fn row(title: &str) -> Row {
    Row { id: Uuid::new_v4(), title: title.into(), stage: "idea".into() }
}

#[test]
fn available_follows_canonical_order() {
    let configs: ViewConfigs<Row> = ViewConfigs::default()
        .with_kanban(KanbanConfig::new(vec![], |r: &Row| r.stage.clone(), CardConfig::new(|r: &Row| r.title.clone())))
        .with_table(TableConfig::new(vec![Column::new("title", "Title", |r: &Row| r.title.clone())]));
    assert_eq!(configs.available(), vec![ViewType::Table, ViewType::Kanban]);
}

#[test]
fn empty_configs_have_no_available_views() {
    let configs: ViewConfigs<Row> = ViewConfigs::default();
    assert!(configs.available().is_empty());
    assert!(!configs.has(ViewType::Table));
}

#[test]
fn column_cell_uses_typed_accessor() {
    let column = Column::new("title", "Title", |r: &Row| r.title.to_uppercase()).align(Align::Right);
    assert_eq!(column.cell(&row("budget")), "BUDGET");
    assert_eq!(column.align, Align::Right);
}

#[test]
fn card_drops_blank_optional_fields() {
    let config = CardConfig::new(|r: &Row| r.title.clone())
        .subtitle(|_: &Row| String::new())
        .body(|r: &Row| format!("stage: {}", r.stage))
        .badges(|r: &Row| vec![r.stage.clone()]);
    let r = row("Pricing test");
    let card = config.card(&r);
    assert_eq!(card.id, r.id);
    assert_eq!(card.title, "Pricing test");
    assert!(card.subtitle.is_none());
    assert_eq!(card.body.as_deref(), Some("stage: idea"));
    assert_eq!(card.badges, vec!["idea".to_string()]);
}

#[test]
fn kanban_group_of_applies_key_function() {
    let config = KanbanConfig::new(
        vec![KanbanGroup::new("idea", "Idea", "#999")],
        |r: &Row| r.stage.clone(),
        CardConfig::new(|r: &Row| r.title.clone()),
    );
    assert_eq!(config.group_of(&row("x")), "idea");
}
