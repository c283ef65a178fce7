//! Pending-change store.
//!
//! Entity-keyed partial field maps holding every edit the user made but has
//! not saved yet. An entity appears as a key only while at least one of its
//! fields differs from the value the table would otherwise show (the
//! baseline), so an edit that is typed back to its original value leaves
//! no trace.

use std::collections::BTreeMap;

use mps_model::{EntityId, FieldMap, FieldValue};

/// Uncommitted edits keyed by entity id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingChangeStore {
    entries: BTreeMap<EntityId, FieldMap>,
}

impl PendingChangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `{field: value}` into the entity's pending changes.
    ///
    /// When `value` equals `baseline` the field is dropped instead, and the
    /// entity disappears once none of its fields differ. A field the entity
    /// does not have reads as `null`.
    pub fn update_cell(
        &mut self,
        id: &EntityId,
        field: &str,
        value: FieldValue,
        baseline: Option<&FieldValue>,
    ) {
        let unchanged = match baseline {
            Some(baseline) => baseline == &value,
            None => value.is_null(),
        };
        if unchanged {
            self.remove_field(id, field);
            return;
        }
        self.entries
            .entry(id.clone())
            .or_default()
            .insert(field.to_string(), value);
    }

    /// Apply the same field value to every listed entity.
    pub fn bulk_edit<'a, I, F>(&mut self, field: &str, value: &FieldValue, ids: I, baseline: F)
    where
        I: IntoIterator<Item = &'a EntityId>,
        F: Fn(&EntityId) -> Option<FieldValue>,
    {
        for id in ids {
            let base = baseline(id);
            self.update_cell(id, field, value.clone(), base.as_ref());
        }
    }

    fn remove_field(&mut self, id: &EntityId, field: &str) {
        if let Some(fields) = self.entries.get_mut(id) {
            fields.remove(field);
            if fields.is_empty() {
                self.entries.remove(id);
            }
        }
    }

    pub fn get(&self, id: &EntityId) -> Option<&FieldMap> {
        self.entries.get(id)
    }

    pub fn value(&self, id: &EntityId, field: &str) -> Option<&FieldValue> {
        self.entries.get(id)?.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &FieldMap)> {
        self.entries.iter()
    }

    /// Copy of every entry, in id order.
    pub fn snapshot(&self) -> Vec<(EntityId, FieldMap)> {
        self.entries
            .iter()
            .map(|(id, fields)| (id.clone(), fields.clone()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<FieldMap> {
        self.entries.remove(id)
    }

    /// Drop the fields of `id` whose pending value still equals `committed`.
    ///
    /// Fields edited again after the snapshot was taken keep their newer value.
    pub fn settle(&mut self, id: &EntityId, committed: &FieldMap) {
        for (field, value) in committed {
            if self.value(id, field) == Some(value) {
                self.remove_field(id, field);
            }
        }
    }

    /// Drop every field for which `is_baseline(id, field, value)` holds.
    pub fn prune<F>(&mut self, is_baseline: F)
    where
        F: Fn(&EntityId, &str, &FieldValue) -> bool,
    {
        for (id, fields) in &mut self.entries {
            fields.retain(|field, value| !is_baseline(id, field, value));
        }
        self.entries.retain(|_, fields| !fields.is_empty());
    }

    /// Keep only entities for which `keep` holds.
    pub fn retain_ids<F>(&mut self, keep: F)
    where
        F: Fn(&EntityId) -> bool,
    {
        self.entries.retain(|id, _| keep(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(value: &str) -> EntityId {
        EntityId::new(value).unwrap()
    }

    #[test]
    fn update_merges_into_existing_entry() {
        let mut store = PendingChangeStore::new();
        store.update_cell(&id("T1"), "TC_Budget", json!(150), Some(&json!(100)));
        store.update_cell(&id("T1"), "TC_Label", json!("Search"), None);
        let fields = store.get(&id("T1")).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["TC_Budget"], json!(150));
    }

    #[test]
    fn returning_to_baseline_removes_entry() {
        let mut store = PendingChangeStore::new();
        store.update_cell(&id("T1"), "TC_Budget", json!(150), Some(&json!(100)));
        store.update_cell(&id("T1"), "TC_Budget", json!(100), Some(&json!(100)));
        assert!(store.is_empty());
    }

    #[test]
    fn null_on_an_absent_field_is_no_change() {
        let mut store = PendingChangeStore::new();
        store.update_cell(&id("T2"), "TC_Buy_Type", FieldValue::Null, None);
        assert!(store.is_empty());

        store.update_cell(&id("T2"), "TC_Buy_Type", json!("CPM"), None);
        store.update_cell(&id("T2"), "TC_Buy_Type", FieldValue::Null, None);
        assert!(store.is_empty());
    }

    #[test]
    fn bulk_edit_fans_out() {
        let mut store = PendingChangeStore::new();
        let ids = [id("T1"), id("T2"), id("T3")];
        store.bulk_edit("TC_Status", &json!("Active"), &ids, |id| {
            (id.as_str() == "T2").then(|| json!("Active"))
        });
        assert_eq!(store.len(), 2);
        assert!(store.get(&id("T2")).is_none());
    }

    #[test]
    fn settle_keeps_newer_edits() {
        let mut store = PendingChangeStore::new();
        store.update_cell(&id("S1"), "SECTION_Name", json!("Q1"), None);
        store.update_cell(&id("S1"), "SECTION_Budget", json!(10), None);
        let committed = store.get(&id("S1")).unwrap().clone();
        store.update_cell(&id("S1"), "SECTION_Budget", json!(20), None);

        store.settle(&id("S1"), &committed);
        let left = store.get(&id("S1")).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left["SECTION_Budget"], json!(20));
    }

    #[test]
    fn prune_removes_empty_entries() {
        let mut store = PendingChangeStore::new();
        store.update_cell(&id("S1"), "SECTION_Name", json!("Q1"), None);
        store.update_cell(&id("S2"), "SECTION_Name", json!("Q2"), None);
        store.prune(|id, _, _| id.as_str() == "S1");
        assert_eq!(store.len(), 1);
        assert!(store.get(&id("S1")).is_none());
    }
}
