//! Projected table rows.

use mps_model::{EntityId, EntityKind, EntityPath, FieldMap, FieldValue};
use serde::Serialize;

/// One line of the flattened hierarchy.
///
/// Derived from canonical data plus local edits on every projection and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub path: EntityPath,
    pub kind: EntityKind,
    /// Indentation level, 0 for sections up to 3 for créatifs.
    pub level: usize,
    /// Effective field values.
    pub data: FieldMap,
    pub is_editable: bool,
}

impl TableRow {
    pub fn id(&self) -> &EntityId {
        self.path.id()
    }

    pub fn parent_id(&self) -> Option<&EntityId> {
        self.path.parent_id()
    }

    pub fn section_id(&self) -> &EntityId {
        self.path.section_id()
    }

    pub fn tactique_id(&self) -> Option<&EntityId> {
        self.path.tactique_id()
    }

    pub fn placement_id(&self) -> Option<&EntityId> {
        self.path.placement_id()
    }

    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.data.get(field)
    }

    /// Label shown in the hierarchy column.
    pub fn label(&self) -> &str {
        self.data
            .get(self.kind.label_key())
            .and_then(FieldValue::as_str)
            .unwrap_or_default()
    }
}
