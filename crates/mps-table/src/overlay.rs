//! Saved-value overlay.
//!
//! After a successful commit the store holds the new values, but the
//! canonical plan in memory does not until the next reload. The overlay
//! keeps the committed values visible in between. Each entry is stamped
//! with the canonical version that must be reached before it can go: once
//! canonical data at or past that version is installed, the entry is
//! dropped.

use std::collections::BTreeMap;

use mps_model::{EntityId, FieldMap, FieldValue};

#[derive(Debug, Clone, PartialEq)]
struct SavedEntry {
    fields: FieldMap,
    stamp: u64,
}

/// Committed values not yet reflected in canonical data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedOverlay {
    entries: BTreeMap<EntityId, SavedEntry>,
}

impl SavedOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record committed fields, valid until canonical version `stamp`.
    pub fn record(&mut self, id: &EntityId, fields: &FieldMap, stamp: u64) {
        let entry = self.entries.entry(id.clone()).or_insert_with(|| SavedEntry {
            fields: FieldMap::new(),
            stamp,
        });
        entry.stamp = entry.stamp.max(stamp);
        for (field, value) in fields {
            entry.fields.insert(field.clone(), value.clone());
        }
    }

    pub fn value(&self, id: &EntityId, field: &str) -> Option<&FieldValue> {
        self.entries.get(id)?.fields.get(field)
    }

    pub fn fields(&self, id: &EntityId) -> Option<&FieldMap> {
        self.entries.get(id).map(|e| &e.fields)
    }

    /// Drop every entry whose stamp is at or below `canonical_version`.
    ///
    /// Returns the number of entries dropped.
    pub fn invalidate(&mut self, canonical_version: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.stamp > canonical_version);
        before - self.entries.len()
    }

    pub fn remove(&mut self, id: &EntityId) {
        self.entries.remove(id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entries_survive_until_their_version() {
        let id = EntityId::new("S1").unwrap();
        let mut fields = FieldMap::new();
        fields.insert("SECTION_Name".to_string(), json!("Q1"));

        let mut overlay = SavedOverlay::new();
        overlay.record(&id, &fields, 3);
        assert_eq!(overlay.invalidate(2), 0);
        assert_eq!(overlay.value(&id, "SECTION_Name"), Some(&json!("Q1")));
        assert_eq!(overlay.invalidate(3), 1);
        assert!(overlay.is_empty());
    }
}
