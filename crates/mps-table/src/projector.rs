//! Row projector.
//!
//! Flattens the canonical plan into an ordered row list, depth-first.
//! Sections are always emitted; everything below a section is emitted only
//! when that section is expanded. Exactly one level is editable at a time.
//!
//! Cell values resolve in priority order: pending change, saved overlay,
//! canonical value.

use std::collections::BTreeSet;

use mps_model::{EntityId, EntityKind, EntityPath, FieldMap, FieldValue, PlanData};

use crate::overlay::SavedOverlay;
use crate::pending::PendingChangeStore;
use crate::row::TableRow;

/// Effective value of one field.
pub fn effective_value(
    plan: &PlanData,
    pending: &PendingChangeStore,
    overlay: &SavedOverlay,
    path: &EntityPath,
    field: &str,
) -> Option<FieldValue> {
    let id = path.id();
    if let Some(value) = pending.value(id, field) {
        return Some(value.clone());
    }
    baseline_value(plan, overlay, path, field)
}

/// Value a field shows when it has no pending change.
pub fn baseline_value(
    plan: &PlanData,
    overlay: &SavedOverlay,
    path: &EntityPath,
    field: &str,
) -> Option<FieldValue> {
    if let Some(value) = overlay.value(path.id(), field) {
        return Some(value.clone());
    }
    plan.fields_of(path)?.remove(field)
}

/// All effective fields of one entity.
pub fn effective_fields(
    plan: &PlanData,
    pending: &PendingChangeStore,
    overlay: &SavedOverlay,
    path: &EntityPath,
) -> Option<FieldMap> {
    let mut fields = plan.fields_of(path)?;
    let id = path.id();
    for layer in [overlay.fields(id), pending.get(id)].into_iter().flatten() {
        for (field, value) in layer {
            fields.insert(field.clone(), value.clone());
        }
    }
    Some(fields)
}

/// Project the plan into table rows.
pub fn project_rows(
    plan: &PlanData,
    pending: &PendingChangeStore,
    overlay: &SavedOverlay,
    selected_level: EntityKind,
    expanded: &BTreeSet<EntityId>,
) -> Vec<TableRow> {
    let mut rows = Vec::with_capacity(plan.sections.len());
    for section in plan.children_of(None) {
        let open = expanded.contains(section.id());
        let below = if open {
            plan.descendants(&section)
        } else {
            Vec::new()
        };
        for path in std::iter::once(section).chain(below) {
            if let Some(row) = project_row(plan, pending, overlay, selected_level, path) {
                rows.push(row);
            }
        }
    }
    rows
}

fn project_row(
    plan: &PlanData,
    pending: &PendingChangeStore,
    overlay: &SavedOverlay,
    selected_level: EntityKind,
    path: EntityPath,
) -> Option<TableRow> {
    let data = effective_fields(plan, pending, overlay, &path)?;
    let kind = path.kind();
    Some(TableRow {
        kind,
        level: kind.depth(),
        data,
        is_editable: kind == selected_level,
        path,
    })
}
