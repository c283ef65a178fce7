//! Bulk operations: fan one value or a whole row out to many entities.
//!
//! These functions only decide *what* to write. The engine applies the
//! resulting [`BulkEdit`] through the pending-change store, which keeps the
//! no-net-change invariant.

use mps_model::{EntityId, EntityKind, FieldMap, FieldValue, TIMESTAMP_KEYS};

/// Fields that copy-row never propagates, besides parent keys and order fields.
pub const COPY_DENYLIST: &[&str] = &["id", TIMESTAMP_KEYS[0], TIMESTAMP_KEYS[1]];

/// Whether copy-row skips `field`.
///
/// Structural fields are excluded so that a copy can never re-parent or
/// re-order the target.
pub fn is_copy_excluded(field: &str) -> bool {
    COPY_DENYLIST.contains(&field)
        || EntityKind::ALL
            .iter()
            .any(|kind| kind.order_key() == field || kind.parent_key() == Some(field))
}

/// A set of field changes destined for several entities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkEdit {
    pub changes: FieldMap,
    pub targets: Vec<EntityId>,
}

impl BulkEdit {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() || self.targets.is_empty()
    }
}

/// Same value, many entities.
pub fn bulk_edit(field: &str, value: FieldValue, targets: &[EntityId]) -> BulkEdit {
    let mut changes = FieldMap::new();
    changes.insert(field.to_string(), value);
    BulkEdit {
        changes,
        targets: targets.to_vec(),
    }
}

/// Propagate the source row's effective `field` to every target.
///
/// The source itself is never a target. A source without the field fans
/// out an explicit null.
pub fn fill_down(
    source_id: &EntityId,
    source_fields: &FieldMap,
    field: &str,
    targets: &[EntityId],
) -> BulkEdit {
    let value = source_fields.get(field).cloned().unwrap_or_default();
    let targets: Vec<EntityId> = targets
        .iter()
        .filter(|id| *id != source_id)
        .cloned()
        .collect();
    bulk_edit(field, value, &targets)
}

/// Propagate every copyable field of the source row to same-type targets.
///
/// Targets of another kind are skipped without error.
pub fn copy_values<'a, I>(
    source_id: &EntityId,
    source_kind: EntityKind,
    source_fields: &FieldMap,
    targets: I,
) -> BulkEdit
where
    I: IntoIterator<Item = (&'a EntityId, EntityKind)>,
{
    let changes: FieldMap = source_fields
        .iter()
        .filter(|(field, _)| !is_copy_excluded(field))
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect();
    let targets = targets
        .into_iter()
        .filter(|(id, kind)| *kind == source_kind && *id != source_id)
        .map(|(id, _)| id.clone())
        .collect();
    BulkEdit { changes, targets }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mps_model::{PlanEntity, Tactique};
    use serde_json::json;

    fn id(value: &str) -> EntityId {
        EntityId::new(value).unwrap()
    }

    #[test]
    fn structural_fields_are_excluded() {
        for field in [
            "id",
            "createdAt",
            "updatedAt",
            "TC_SectionId",
            "PL_TactiqueId",
            "CR_PlacementId",
            "SECTION_Order",
            "TC_Order",
        ] {
            assert!(is_copy_excluded(field), "{field}");
        }
        assert!(!is_copy_excluded("TC_Label"));
    }

    #[test]
    fn fill_down_skips_the_source() {
        let mut fields = FieldMap::new();
        fields.insert("TC_Buy_Type".to_string(), json!("CPM"));
        let edit = fill_down(&id("T1"), &fields, "TC_Buy_Type", &[id("T1"), id("T2")]);
        assert_eq!(edit.targets, vec![id("T2")]);
        assert_eq!(edit.changes["TC_Buy_Type"], json!("CPM"));
    }

    #[test]
    fn copy_values_filters_kinds_and_fields() {
        let mut source = Tactique::new(id("T1"), id("S1"), "Search", 3);
        source.extra.insert("createdAt".to_string(), json!("2026-01-01"));
        let fields = source.to_fields();
        let t2 = id("T2");
        let p1 = id("P1");
        let edit = copy_values(
            &id("T1"),
            EntityKind::Tactique,
            &fields,
            [(&t2, EntityKind::Tactique), (&p1, EntityKind::Placement)],
        );
        assert_eq!(edit.targets, vec![t2]);
        assert_eq!(edit.changes["TC_Label"], json!("Search"));
        assert!(!edit.changes.contains_key("TC_SectionId"));
        assert!(!edit.changes.contains_key("TC_Order"));
        assert!(!edit.changes.contains_key("createdAt"));
        assert!(!edit.changes.contains_key("id"));
    }
}
