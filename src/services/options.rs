//! Dropdown options for the canvas and assumption forms.
//!
//! The database-backed lists are loaded concurrently; the enum lists are
//! static.

use serde::Serialize;
use sqlx::PgPool;

use super::ContentError;
use super::assumption::{Category, Evidence, Importance, ValidationStatus};
use super::canvas::{self, CanvasKind};
use super::canvas_item::{self, ItemType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self { value: value.into(), label: label.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CanvasFormOptions {
    pub item_types: Vec<SelectOption>,
    pub categories: Vec<SelectOption>,
    pub importance: Vec<SelectOption>,
    pub evidence: Vec<SelectOption>,
    pub validation_statuses: Vec<SelectOption>,
    pub business_models: Vec<SelectOption>,
    pub value_maps: Vec<SelectOption>,
    pub customer_profiles: Vec<SelectOption>,
    pub canvas_items: Vec<SelectOption>,
}

/// "value_proposition" -> "Value proposition".
fn humanize(text: &str) -> String {
    let spaced = text.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn enum_options<T: Copy>(all: &[T], as_str: impl Fn(T) -> &'static str) -> Vec<SelectOption> {
    all.iter().map(|v| SelectOption::new(as_str(*v), humanize(as_str(*v)))).collect()
}

/// # Errors
///
/// Returns the first database error from any of the lookups.
pub async fn canvas_form_options(pool: &PgPool) -> Result<CanvasFormOptions, ContentError> {
    let (business_models, value_maps, customer_profiles, items) = tokio::try_join!(
        canvas::list(pool, CanvasKind::BusinessModel),
        canvas::list(pool, CanvasKind::ValueMap),
        canvas::list(pool, CanvasKind::CustomerProfile),
        canvas_item::list(pool, None),
    )?;

    let canvases = |rows: Vec<canvas::Canvas>| -> Vec<SelectOption> {
        rows.into_iter().map(|c| SelectOption::new(c.id.to_string(), c.name)).collect()
    };

    Ok(CanvasFormOptions {
        item_types: ItemType::ALL.iter().map(|t| SelectOption::new(t.as_str(), t.label())).collect(),
        categories: enum_options(Category::ALL, Category::as_str),
        importance: enum_options(Importance::ALL, Importance::as_str),
        evidence: enum_options(Evidence::ALL, Evidence::as_str),
        validation_statuses: enum_options(ValidationStatus::ALL, ValidationStatus::as_str),
        business_models: canvases(business_models),
        value_maps: canvases(value_maps),
        customer_profiles: canvases(customer_profiles),
        canvas_items: items
            .into_iter()
            .map(|i| SelectOption::new(i.id.to_string(), format!("{} ({})", i.title, i.item_type.label())))
            .collect(),
    })
}
