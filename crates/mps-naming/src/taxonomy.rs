//! Taxonomy rendering.
//!
//! A taxonomy template is free text with `<VARIABLE>` placeholders, e.g.
//! `<PUBLISHER>_<FORMAT>_<MARKET>`. Placements and créatifs store the value
//! chosen for each variable in their taxonomy values map; a value is either
//! free text or a reference to a shortcode, rendered as its code or its
//! display name.

use std::collections::BTreeMap;

use mps_model::FieldMap;
use mps_store::PlanStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::ShortcodeCache;
use crate::error::{NamingError, Result};

// =============================================================================
// VALUES
// =============================================================================

/// Which part of a shortcode is written into the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    #[default]
    Code,
    DisplayName,
}

/// The value chosen for one taxonomy variable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxonomyValue {
    /// Free text, used when no shortcode is referenced.
    #[serde(default)]
    pub value: String,
    #[serde(rename = "shortcodeId", default, skip_serializing_if = "Option::is_none")]
    pub shortcode_id: Option<String>,
    #[serde(default)]
    pub format: ValueFormat,
}

impl TaxonomyValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn shortcode(id: impl Into<String>, format: ValueFormat) -> Self {
        Self {
            value: String::new(),
            shortcode_id: Some(id.into()),
            format,
        }
    }
}

/// Read the taxonomy values stored on an entity.
///
/// Plain strings are free text; objects are parsed as [`TaxonomyValue`].
/// Entries of any other shape are skipped.
pub fn taxonomy_values(fields: &FieldMap) -> BTreeMap<String, TaxonomyValue> {
    let mut out = BTreeMap::new();
    for (name, raw) in fields {
        let value = match raw {
            Value::String(text) => TaxonomyValue::text(text.clone()),
            Value::Object(_) => match serde_json::from_value(raw.clone()) {
                Ok(value) => value,
                Err(error) => {
                    tracing::warn!(variable = %name, %error, "skipping malformed taxonomy value");
                    continue;
                }
            },
            _ => continue,
        };
        out.insert(name.clone(), value);
    }
    out
}

// =============================================================================
// TEMPLATES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Variable(&'a str),
}

fn is_variable_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Split a template into text and `<VARIABLE>` segments.
///
/// A `<` without a matching `>`, or enclosing anything other than a
/// variable name, is kept as literal text.
fn segments(template: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('<') {
        let after = &rest[open + 1..];
        match after.find('>') {
            Some(close) if is_variable_name(&after[..close]) => {
                if open > 0 {
                    out.push(Segment::Text(&rest[..open]));
                }
                out.push(Segment::Variable(&after[..close]));
                rest = &after[close + 1..];
            }
            _ => {
                out.push(Segment::Text(&rest[..=open]));
                rest = after;
            }
        }
    }
    if !rest.is_empty() {
        out.push(Segment::Text(rest));
    }
    out
}

/// Variable names referenced by `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    segments(template)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Variable(name) => Some(name),
            Segment::Text(_) => None,
        })
        .collect()
}

/// Render `template`, replacing each `<VARIABLE>` with its chosen value.
///
/// Variables without a value render as an empty string. Shortcode
/// references are resolved through `cache`.
pub async fn render_taxonomy<S: PlanStore>(
    template: &str,
    values: &BTreeMap<String, TaxonomyValue>,
    cache: &ShortcodeCache,
    store: &S,
) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    for segment in segments(template) {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Variable(name) => {
                let Some(value) = values.get(name) else {
                    tracing::debug!(variable = name, "taxonomy variable has no value");
                    continue;
                };
                out.push_str(&resolve(name, value, cache, store).await?);
            }
        }
    }
    Ok(out)
}

async fn resolve<S: PlanStore>(
    variable: &str,
    value: &TaxonomyValue,
    cache: &ShortcodeCache,
    store: &S,
) -> Result<String> {
    let Some(shortcode_id) = &value.shortcode_id else {
        return Ok(value.value.clone());
    };
    let shortcode = cache
        .get_or_load(store, shortcode_id)
        .await?
        .ok_or_else(|| NamingError::UnknownShortcode {
            variable: variable.to_string(),
            shortcode_id: shortcode_id.clone(),
        })?;
    Ok(match value.format {
        ValueFormat::Code => shortcode.code,
        ValueFormat::DisplayName => shortcode.display_name,
    })
}
