//! Field helpers shared by the entity services: closed text enums, slugs,
//! and the handful of format checks forms run before writing.

use time::Date;
use time::format_description::well_known::Iso8601;

use crate::error::FieldErrors;

/// Declare a closed enumeration stored as TEXT.
///
/// Generates serde names, `as_str`/`from_str`, `ALL`, `Display`, and the
/// `TryFrom<String>` used by `#[sqlx(try_from = "String")]` row fields.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            #[must_use]
            #[allow(clippy::should_implement_trait)]
            pub fn from_str(raw: &str) -> Option<Self> {
                match raw {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                Self::from_str(&raw).ok_or_else(|| format!("unknown {} value: {raw}", stringify!($name)))
            }
        }
    };
}

pub(crate) use text_enum;

/// Lowercase, ASCII-alphanumeric words joined by single dashes.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut dash = false;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch.to_ascii_lowercase());
            dash = false;
        } else {
            dash = true;
        }
    }
    slug
}

/// Use the explicit slug when given, otherwise derive one from `title`.
#[must_use]
pub fn slug_or_derive(slug: Option<&str>, title: &str) -> String {
    match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(explicit) => slugify(explicit),
        None => slugify(title),
    }
}

/// Record an error unless `value` is an absolute http(s) URL.
pub fn check_url(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return;
    };
    match url::Url::parse(raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some() => {}
        _ => errors.add(field, "must be a valid http(s) URL"),
    }
}

/// Record an error unless `value` is an ISO `YYYY-MM-DD` date.
pub fn check_date(errors: &mut FieldErrors, field: &str, value: &str) {
    if parse_date(value).is_none() {
        errors.add(field, "must be a date in YYYY-MM-DD form");
    }
}

#[must_use]
pub fn parse_date(value: &str) -> Option<Date> {
    let trimmed = value.trim();
    if trimmed.len() != 10 {
        return None;
    }
    Date::parse(trimmed, &Iso8601::DATE).ok()
}

/// Trim and drop blank optional text.
#[must_use]
pub fn clean_opt(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Trim, drop blanks, and dedupe tags while keeping first-seen order.
#[must_use]
pub fn clean_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags.iter().map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()) {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
#[path = "fields_test.rs"]
mod tests;
