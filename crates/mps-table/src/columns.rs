//! Column definitions and the per-level column catalog.
//!
//! Each hierarchy level has its own set of columns. A column knows how to
//! validate a typed value and how to format it for display; the catalog
//! trait lets the host application supply its own column set.

use chrono::NaiveDate;
use mps_model::{EntityKind, FieldValue, display_value};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Date format accepted by date columns.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// COLUMN
// =============================================================================

/// Value type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Number,
    Select,
    Date,
    Currency,
    Readonly,
}

impl ColumnKind {
    /// Numeric columns accept arrow-key navigation even mid-edit.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Currency)
    }
}

/// One allowed value of a select column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A table column bound to one storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub key: String,
    pub label: String,
    pub kind: ColumnKind,
    pub width: u16,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub required: bool,
}

impl Column {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            width: match kind {
                ColumnKind::Text => 200,
                ColumnKind::Select | ColumnKind::Date => 140,
                _ => 120,
            },
            options: Vec::new(),
            required: false,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_options<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.options = values
            .into_iter()
            .map(|value| {
                let value = value.into();
                SelectOption::new(value.clone(), value)
            })
            .collect();
        self
    }

    pub fn is_editable(&self) -> bool {
        self.kind != ColumnKind::Readonly
    }

    /// Check a typed value against this column.
    ///
    /// Empty values (null or blank text) pass unless the column is required.
    pub fn validate(&self, value: &FieldValue) -> bool {
        if is_blank(value) {
            return !self.required;
        }
        match self.kind {
            ColumnKind::Readonly => true,
            ColumnKind::Text => value.is_string(),
            ColumnKind::Number => value.as_f64().is_some_and(f64::is_finite),
            ColumnKind::Currency => value.as_f64().is_some_and(|n| n.is_finite() && n >= 0.0),
            ColumnKind::Select => value
                .as_str()
                .is_some_and(|v| self.options.iter().any(|o| o.value == v)),
            ColumnKind::Date => value
                .as_str()
                .is_some_and(|v| NaiveDate::parse_from_str(v, DATE_FORMAT).is_ok()),
        }
    }

    /// Render a value for display.
    pub fn format(&self, value: &FieldValue) -> String {
        match (self.kind, value) {
            (ColumnKind::Currency, Value::Number(n)) => match n.as_f64() {
                Some(amount) => format!("{amount:.2} $"),
                None => n.to_string(),
            },
            (ColumnKind::Select, Value::String(v)) => self
                .options
                .iter()
                .find(|o| &o.value == v)
                .map_or_else(|| v.clone(), |o| o.label.clone()),
            _ => display_value(value),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// Source of the columns shown for each hierarchy level.
pub trait ColumnCatalog {
    /// Columns for `level`, in display order.
    fn columns_for_level(&self, level: EntityKind) -> Vec<Column>;

    fn column(&self, level: EntityKind, key: &str) -> Option<Column> {
        self.columns_for_level(level)
            .into_iter()
            .find(|c| c.key == key)
    }

    /// Display text for a value; unknown columns fall back to plain text.
    fn format_value(&self, level: EntityKind, key: &str, value: &FieldValue) -> String {
        match self.column(level, key) {
            Some(column) => column.format(value),
            None => display_value(value),
        }
    }

    /// Whether `value` is acceptable for the column; unknown columns accept anything.
    fn validate_value(&self, level: EntityKind, key: &str, value: &FieldValue) -> bool {
        self.column(level, key)
            .is_none_or(|column| column.validate(value))
    }
}

/// Built-in column set covering the fields every plan carries.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultColumns;

impl ColumnCatalog for DefaultColumns {
    fn columns_for_level(&self, level: EntityKind) -> Vec<Column> {
        match level {
            EntityKind::Section => vec![
                Column::new("SECTION_Name", "Section", ColumnKind::Text).required(),
                Column::new("SECTION_Budget", "Budget", ColumnKind::Currency),
                Column::new("SECTION_Color", "Color", ColumnKind::Text),
                Column::new("SECTION_Order", "#", ColumnKind::Readonly),
            ],
            EntityKind::Tactique => vec![
                Column::new("TC_Label", "Tactique", ColumnKind::Text).required(),
                Column::new("TC_Budget", "Budget", ColumnKind::Currency),
                Column::new("TC_Status", "Status", ColumnKind::Select).with_options([
                    "Planned",
                    "Active",
                    "Completed",
                    "Cancelled",
                ]),
                Column::new("TC_StartDate", "Start", ColumnKind::Date),
                Column::new("TC_EndDate", "End", ColumnKind::Date),
                Column::new("TC_Media_Type", "Media type", ColumnKind::Text),
                Column::new("TC_Publisher", "Publisher", ColumnKind::Text),
                Column::new("TC_Inventory", "Inventory", ColumnKind::Text),
                Column::new("TC_Buy_Type", "Buy type", ColumnKind::Select)
                    .with_options(["CPM", "CPC", "CPA", "CPV", "Flat"]),
                Column::new("TC_Order", "#", ColumnKind::Readonly),
            ],
            EntityKind::Placement => vec![
                Column::new("PL_Label", "Placement", ColumnKind::Text).required(),
                Column::new("PL_Format", "Format", ColumnKind::Text),
                Column::new("PL_Impressions", "Impressions", ColumnKind::Number),
                Column::new("PL_Order", "#", ColumnKind::Readonly),
            ],
            EntityKind::Creatif => vec![
                Column::new("CR_Label", "Créatif", ColumnKind::Text).required(),
                Column::new("CR_Url", "Landing page", ColumnKind::Text),
                Column::new("CR_Order", "#", ColumnKind::Readonly),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validation_per_kind() {
        let catalog = DefaultColumns;
        let level = EntityKind::Tactique;
        assert!(catalog.validate_value(level, "TC_Budget", &json!(150)));
        assert!(!catalog.validate_value(level, "TC_Budget", &json!(-1)));
        assert!(!catalog.validate_value(level, "TC_Budget", &json!("150")));
        assert!(catalog.validate_value(level, "TC_Status", &json!("Active")));
        assert!(!catalog.validate_value(level, "TC_Status", &json!("Paused")));
        assert!(catalog.validate_value(level, "TC_StartDate", &json!("2026-03-01")));
        assert!(!catalog.validate_value(level, "TC_StartDate", &json!("03/01/2026")));
        assert!(catalog.validate_value(level, "TC_StartDate", &json!("")));
        assert!(!catalog.validate_value(level, "TC_Label", &json!("  ")));
        assert!(catalog.validate_value(level, "TC_Unknown", &json!([1, 2])));
    }

    #[test]
    fn formatting() {
        let catalog = DefaultColumns;
        assert_eq!(
            catalog.format_value(EntityKind::Section, "SECTION_Budget", &json!(1500)),
            "1500.00 $"
        );
        assert_eq!(
            catalog.format_value(EntityKind::Section, "SECTION_Name", &json!("TV")),
            "TV"
        );
        assert_eq!(
            catalog.format_value(EntityKind::Section, "SECTION_Color", &Value::Null),
            ""
        );
    }

    #[test]
    fn readonly_columns_are_not_editable() {
        let column = DefaultColumns
            .column(EntityKind::Placement, "PL_Order")
            .unwrap();
        assert!(!column.is_editable());
        assert!(!column.kind.is_numeric());
    }
}
