//! Move selection analysis.
//!
//! Turns an arbitrary multi-level selection into the set of root elements
//! to move. An element is a root when none of the other selected elements
//! is one of its ancestors; moving a root carries its whole subtree, so
//! selected descendants ride along.
//!
//! Problems are reported as data in [`SelectionAnalysis::error_message`].

use std::collections::HashSet;

use mps_model::{EntityId, EntityKind, EntityPath, FieldMap, HierarchyPath, PlanData};
use serde::Serialize;

use crate::level::TargetLevel;

// =============================================================================
// SELECTED ITEMS
// =============================================================================

/// One selected element, normalized to id, kind and ancestor ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedItem {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Ancestor ids, coarse to fine (`[section]` for a tactique).
    pub parent_path: HierarchyPath,
    pub label: String,
}

impl SelectedItem {
    pub fn from_path(path: &EntityPath, label: impl Into<String>) -> Self {
        Self {
            id: path.id().clone(),
            kind: path.kind(),
            parent_path: path.ancestors(),
            label: label.into(),
        }
    }

    /// Look `id` up in a loaded plan.
    pub fn from_plan(plan: &PlanData, id: &EntityId) -> Option<Self> {
        let path = plan.locate(id)?;
        let label = plan
            .fields_of(&path)
            .and_then(|fields| fields.get(path.kind().label_key()).cloned())
            .map(|value| mps_model::display_value(&value))
            .unwrap_or_default();
        Some(Self::from_path(&path, label))
    }

    /// Build an item from an untagged field map.
    ///
    /// The kind is inferred from the level-specific keys present in
    /// `fields`; `parent_path` must hold one id per ancestor of that kind.
    pub fn from_fields(fields: &FieldMap, parent_path: HierarchyPath) -> Option<Self> {
        let kind = infer_kind(fields)?;
        if parent_path.len() != kind.depth() {
            return None;
        }
        let id = fields.get("id")?.as_str()?;
        let label = fields
            .get(kind.label_key())
            .map(mps_model::display_value)
            .unwrap_or_default();
        Some(Self {
            id: EntityId::new(id).ok()?,
            kind,
            parent_path,
            label,
        })
    }

    /// Whether `other` is an ancestor of this item.
    ///
    /// `other`'s id must sit in this item's parent path at the index of
    /// `other`'s depth.
    pub fn is_child_of(&self, other: &SelectedItem) -> bool {
        other.kind.depth() < self.kind.depth()
            && self.parent_path.ids().get(other.kind.depth()) == Some(&other.id)
    }

    /// Full typed path, when the parent path is well formed.
    pub fn path(&self) -> Option<EntityPath> {
        EntityPath::new(self.kind, &self.parent_path, self.id.clone()).ok()
    }
}

/// Infer the level of an untagged field map from its level-specific keys.
pub fn infer_kind(fields: &FieldMap) -> Option<EntityKind> {
    EntityKind::ALL.into_iter().find(|kind| {
        fields.contains_key(kind.label_key()) || fields.contains_key(kind.order_key())
    })
}

// =============================================================================
// ANALYSIS
// =============================================================================

/// Outcome of analysing a selection for a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionAnalysis {
    pub is_valid: bool,
    pub can_move: bool,
    /// Selected elements with no selected ancestor, in selection order.
    pub root_elements: Vec<SelectedItem>,
    /// Every selected element, duplicates removed.
    pub all_elements: Vec<SelectedItem>,
    pub move_level: Option<EntityKind>,
    pub target_level: Option<TargetLevel>,
    pub total_items_to_move: usize,
    pub error_message: Option<String>,
}

impl SelectionAnalysis {
    fn rejected(
        all_elements: Vec<SelectedItem>,
        root_elements: Vec<SelectedItem>,
        message: String,
    ) -> Self {
        tracing::debug!(reason = %message, "selection rejected");
        Self {
            is_valid: false,
            can_move: false,
            total_items_to_move: all_elements.len(),
            root_elements,
            all_elements,
            move_level: None,
            target_level: None,
            error_message: Some(message),
        }
    }
}

/// Analyse a selection: find the roots and check that they can move together.
///
/// Checks run in order: at least one root, a single root kind, and no
/// ancestor relation between roots.
pub fn analyze_selection(items: &[SelectedItem]) -> SelectionAnalysis {
    let mut seen = HashSet::new();
    let all: Vec<SelectedItem> = items
        .iter()
        .filter(|item| seen.insert(item.id.clone()))
        .cloned()
        .collect();

    let roots: Vec<SelectedItem> = all
        .iter()
        .filter(|item| {
            !all.iter()
                .any(|other| other.id != item.id && item.is_child_of(other))
        })
        .cloned()
        .collect();

    let Some(first) = roots.first() else {
        return SelectionAnalysis::rejected(all, roots, "No element selected.".to_string());
    };
    let move_level = first.kind;

    let mut kinds: Vec<EntityKind> = roots.iter().map(|root| root.kind).collect();
    kinds.sort();
    kinds.dedup();
    if kinds.len() > 1 {
        let names: Vec<&str> = kinds.iter().map(|kind| kind.as_str()).collect();
        let message = format!(
            "Cannot move elements of different types together ({}).",
            names.join(", ")
        );
        return SelectionAnalysis::rejected(all, roots, message);
    }

    // Position-agnostic so that malformed parent paths are caught too.
    for root in &roots {
        if let Some(ancestor) = roots
            .iter()
            .find(|other| other.id != root.id && root.parent_path.ids().contains(&other.id))
        {
            let message = format!(
                "Selected elements overlap in the hierarchy: {} is inside {}.",
                root.id, ancestor.id
            );
            return SelectionAnalysis::rejected(all, roots, message);
        }
    }

    tracing::debug!(
        roots = roots.len(),
        selected = all.len(),
        level = %move_level,
        "selection analysed"
    );
    SelectionAnalysis {
        is_valid: true,
        can_move: true,
        total_items_to_move: all.len(),
        root_elements: roots,
        all_elements: all,
        move_level: Some(move_level),
        target_level: Some(TargetLevel::for_move(move_level)),
        error_message: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(value: &str) -> EntityId {
        EntityId::new(value).unwrap()
    }

    fn item(kind: EntityKind, value: &str, parents: &[&str]) -> SelectedItem {
        SelectedItem {
            id: id(value),
            kind,
            parent_path: HierarchyPath::from_ids(parents.iter().map(|p| id(p)).collect()),
            label: value.to_string(),
        }
    }

    #[test]
    fn empty_selection_is_invalid() {
        let analysis = analyze_selection(&[]);
        assert!(!analysis.is_valid);
        assert!(!analysis.can_move);
        assert_eq!(analysis.error_message.as_deref(), Some("No element selected."));
    }

    #[test]
    fn placement_is_child_of_section_and_tactique() {
        let section = item(EntityKind::Section, "S1", &[]);
        let tactique = item(EntityKind::Tactique, "T1", &["S1"]);
        let placement = item(EntityKind::Placement, "P1", &["S1", "T1"]);
        assert!(placement.is_child_of(&tactique));
        assert!(placement.is_child_of(&section));
        assert!(!section.is_child_of(&placement));
        assert!(!tactique.is_child_of(&tactique));
    }

    #[test]
    fn duplicates_count_once() {
        let t1 = item(EntityKind::Tactique, "T1", &["S1"]);
        let analysis = analyze_selection(&[t1.clone(), t1]);
        assert!(analysis.is_valid);
        assert_eq!(analysis.root_elements.len(), 1);
        assert_eq!(analysis.total_items_to_move, 1);
    }

    #[test]
    fn malformed_parent_path_is_a_conflict() {
        // T1 listed at the wrong index so the positional check misses it.
        let t1 = item(EntityKind::Tactique, "T1", &["S1"]);
        let t2 = item(EntityKind::Tactique, "T2", &["T1"]);
        let analysis = analyze_selection(&[t1, t2]);
        assert!(!analysis.is_valid);
        assert!(analysis.error_message.unwrap().contains("overlap"));
    }

    #[test]
    fn mutually_listed_parents_still_leave_roots() {
        let t1 = item(EntityKind::Tactique, "T1", &["T2"]);
        let t2 = item(EntityKind::Tactique, "T2", &["T1"]);
        let analysis = analyze_selection(&[t1, t2]);
        assert_eq!(analysis.root_elements.len(), 2);
        assert!(!analysis.is_valid);
        assert_eq!(
            analysis.error_message.as_deref(),
            Some("Selected elements overlap in the hierarchy: T1 is inside T2.")
        );
    }

    #[test]
    fn kind_is_inferred_from_fields() {
        let fields: FieldMap = json!({"id": "T9", "TC_Label": "Search", "TC_Order": 2})
            .as_object()
            .cloned()
            .unwrap();
        let parsed = SelectedItem::from_fields(&fields, HierarchyPath::from_ids(vec![id("S1")]))
            .unwrap();
        assert_eq!(parsed.kind, EntityKind::Tactique);
        assert_eq!(parsed.label, "Search");
        assert_eq!(parsed.path().unwrap().section_id(), &id("S1"));
        assert!(SelectedItem::from_fields(&fields, HierarchyPath::root()).is_none());
    }
}
