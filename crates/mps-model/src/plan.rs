//! Canonical plan data for one onglet.
//!
//! [`PlanData`] holds the four hierarchy levels as the store returns them:
//! a list of sections plus children lists keyed by parent id. It is the
//! canonical side of every value resolution in the table engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{Creatif, Entity, PlanEntity, Placement, Section, Tactique};
use crate::error::{ModelError, Result};
use crate::fields::FieldMap;
use crate::ids::EntityId;
use crate::kind::EntityKind;
use crate::ordering::renumber;
use crate::path::{EntityPath, HierarchyPath};

/// Sections and their descendants, keyed by parent id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanData {
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Tactiques keyed by section id.
    #[serde(default)]
    pub tactiques: BTreeMap<EntityId, Vec<Tactique>>,
    /// Placements keyed by tactique id.
    #[serde(default)]
    pub placements: BTreeMap<EntityId, Vec<Placement>>,
    /// Créatifs keyed by placement id.
    #[serde(default)]
    pub creatifs: BTreeMap<EntityId, Vec<Creatif>>,
}

/// Outcome of a local removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Removal {
    /// The removed entity followed by all of its descendants.
    pub removed: Vec<EntityId>,
    /// Surviving siblings whose order changed, with the new order.
    pub renumbered: Vec<(EntityPath, u32)>,
}

impl PlanData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort every sibling list by its order field.
    pub fn sort(&mut self) {
        self.sections.sort_by_key(|s| s.order);
        for list in self.tactiques.values_mut() {
            list.sort_by_key(|t| t.order);
        }
        for list in self.placements.values_mut() {
            list.sort_by_key(|p| p.order);
        }
        for list in self.creatifs.values_mut() {
            list.sort_by_key(|c| c.order);
        }
    }

    pub fn tactiques_of(&self, section_id: &EntityId) -> &[Tactique] {
        self.tactiques.get(section_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn placements_of(&self, tactique_id: &EntityId) -> &[Placement] {
        self.placements.get(tactique_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn creatifs_of(&self, placement_id: &EntityId) -> &[Creatif] {
        self.creatifs.get(placement_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every entity path, depth-first in stored order.
    pub fn paths(&self) -> Vec<EntityPath> {
        let mut out = Vec::new();
        for section in &self.sections {
            let path = EntityPath::Section {
                section: section.id.clone(),
            };
            out.push(path.clone());
            out.extend(self.descendants(&path));
        }
        out
    }

    /// Find the full path of an entity by id.
    pub fn locate(&self, id: &EntityId) -> Option<EntityPath> {
        self.paths().into_iter().find(|path| path.id() == id)
    }

    /// Total number of entities across all levels.
    pub fn entity_count(&self) -> usize {
        self.paths().len()
    }

    /// Direct children of `path`, in stored order.
    pub fn children(&self, path: &EntityPath) -> Vec<EntityPath> {
        let ids: Vec<EntityId> = match path {
            EntityPath::Section { section } => ids_of(self.tactiques_of(section)),
            EntityPath::Tactique { tactique, .. } => ids_of(self.placements_of(tactique)),
            EntityPath::Placement { placement, .. } => ids_of(self.creatifs_of(placement)),
            EntityPath::Creatif { .. } => Vec::new(),
        };
        ids.into_iter().filter_map(|id| path.child(id)).collect()
    }

    /// Direct children of `parent`, or every section when `parent` is `None`.
    pub fn children_of(&self, parent: Option<&EntityPath>) -> Vec<EntityPath> {
        match parent {
            Some(path) => self.children(path),
            None => self
                .sections
                .iter()
                .map(|s| EntityPath::Section {
                    section: s.id.clone(),
                })
                .collect(),
        }
    }

    /// Ids of the entity at `path` followed by all of its descendants.
    pub fn subtree_ids(&self, path: &EntityPath) -> Vec<EntityId> {
        let mut ids = vec![path.id().clone()];
        ids.extend(self.descendants(path).iter().map(|d| d.id().clone()));
        ids
    }

    /// All descendants of `path` (excluding itself), depth-first.
    pub fn descendants(&self, path: &EntityPath) -> Vec<EntityPath> {
        let mut out = Vec::new();
        for child in self.children(path) {
            let below = self.descendants(&child);
            out.push(child);
            out.extend(below);
        }
        out
    }

    /// Number of children under `parent`, or of sections when `parent` is `None`.
    pub fn child_count(&self, parent: Option<&EntityPath>) -> usize {
        self.children_of(parent).len()
    }

    /// Clone of the entity at `path`.
    pub fn entity(&self, path: &EntityPath) -> Option<Entity> {
        match path {
            EntityPath::Section { section } => self
                .sections
                .iter()
                .find(|s| &s.id == section)
                .cloned()
                .map(Entity::from),
            EntityPath::Tactique {
                section, tactique, ..
            } => find(self.tactiques_of(section), tactique).map(Entity::from),
            EntityPath::Placement {
                tactique,
                placement,
                ..
            } => find(self.placements_of(tactique), placement).map(Entity::from),
            EntityPath::Creatif {
                placement, creatif, ..
            } => find(self.creatifs_of(placement), creatif).map(Entity::from),
        }
    }

    /// Canonical fields of the entity at `path`.
    pub fn fields_of(&self, path: &EntityPath) -> Option<FieldMap> {
        self.entity(path).map(|entity| entity.to_fields())
    }

    /// Merge a partial update into the entity at `path`.
    pub fn apply_changes(&mut self, path: &EntityPath, changes: &FieldMap) -> Result<()> {
        let missing = || ModelError::EntityNotFound(path.id().to_string());
        match path {
            EntityPath::Section { section } => self
                .sections
                .iter_mut()
                .find(|s| &s.id == section)
                .ok_or_else(missing)?
                .apply_fields(changes),
            EntityPath::Tactique { section, tactique } => {
                find_mut(self.tactiques.get_mut(section), tactique)
                    .ok_or_else(missing)?
                    .apply_fields(changes)
            }
            EntityPath::Placement {
                tactique,
                placement,
                ..
            } => find_mut(self.placements.get_mut(tactique), placement)
                .ok_or_else(missing)?
                .apply_fields(changes),
            EntityPath::Creatif {
                placement, creatif, ..
            } => find_mut(self.creatifs.get_mut(placement), creatif)
                .ok_or_else(missing)?
                .apply_fields(changes),
        }
    }

    /// Insert an entity under `parent` (or as a section when `parent` is `None`).
    ///
    /// The parent foreign key is rewritten to point at `parent`; the order
    /// field is kept as given.
    pub fn insert(&mut self, parent: Option<&EntityPath>, entity: Entity) -> Result<EntityPath> {
        let expected = parent.map_or(Some(EntityKind::Section), |p| p.kind().child());
        if expected != Some(entity.kind()) {
            return Err(ModelError::MalformedPath {
                kind: entity.kind().as_str(),
                expected: entity.kind().depth(),
                found: parent.map_or(0, |p| p.kind().depth() + 1),
            });
        }
        if let Some(parent) = parent
            && self.entity(parent).is_none()
        {
            return Err(ModelError::EntityNotFound(parent.id().to_string()));
        }
        let ancestors = parent.map_or_else(HierarchyPath::root, |p| p.ancestors().child(p.id()));
        let path = EntityPath::new(entity.kind(), &ancestors, entity.id().clone())?;
        match entity {
            Entity::Section(section) => {
                self.sections.push(section);
                self.sections.sort_by_key(|s| s.order);
            }
            Entity::Tactique(mut tactique) => {
                let parent_id = path.section_id().clone();
                tactique.set_parent(&parent_id);
                push_sorted(self.tactiques.entry(parent_id).or_default(), tactique);
            }
            Entity::Placement(mut placement) => {
                let parent_id = path.parent_id().cloned().ok_or_else(|| {
                    ModelError::EntityNotFound(placement.id.to_string())
                })?;
                placement.set_parent(&parent_id);
                push_sorted(self.placements.entry(parent_id).or_default(), placement);
            }
            Entity::Creatif(mut creatif) => {
                let parent_id = path
                    .parent_id()
                    .cloned()
                    .ok_or_else(|| ModelError::EntityNotFound(creatif.id.to_string()))?;
                creatif.set_parent(&parent_id);
                push_sorted(self.creatifs.entry(parent_id).or_default(), creatif);
            }
        }
        Ok(path)
    }

    /// Remove an entity and its descendants without touching sibling orders.
    ///
    /// Returns the removed ids, the entity first.
    pub fn detach(&mut self, path: &EntityPath) -> Result<Vec<EntityId>> {
        if self.entity(path).is_none() {
            return Err(ModelError::EntityNotFound(path.id().to_string()));
        }
        let removed = self.subtree_ids(path);
        self.drop_children(path);

        let id = path.id();
        match path {
            EntityPath::Section { .. } => self.sections.retain(|s| &s.id != id),
            EntityPath::Tactique { section, .. } => retain_others(self.tactiques.get_mut(section), id),
            EntityPath::Placement { tactique, .. } => {
                retain_others(self.placements.get_mut(tactique), id);
            }
            EntityPath::Creatif { placement, .. } => {
                retain_others(self.creatifs.get_mut(placement), id);
            }
        }
        Ok(removed)
    }

    /// Remove an entity and its descendants, then renumber its siblings.
    pub fn remove_entity(&mut self, path: &EntityPath) -> Result<Removal> {
        let removed = self.detach(path)?;
        let changed = match path {
            EntityPath::Section { .. } => renumber(&mut self.sections),
            EntityPath::Tactique { section, .. } => renumber_list(self.tactiques.get_mut(section)),
            EntityPath::Placement { tactique, .. } => {
                renumber_list(self.placements.get_mut(tactique))
            }
            EntityPath::Creatif { placement, .. } => {
                renumber_list(self.creatifs.get_mut(placement))
            }
        };
        let ancestors = path.ancestors();
        let mut renumbered = Vec::with_capacity(changed.len());
        for (sibling, order) in changed {
            renumbered.push((EntityPath::new(path.kind(), &ancestors, sibling)?, order));
        }
        Ok(Removal {
            removed,
            renumbered,
        })
    }

    fn drop_children(&mut self, path: &EntityPath) {
        for child in self.children(path) {
            self.drop_children(&child);
        }
        match path {
            EntityPath::Section { section } => {
                self.tactiques.remove(section);
            }
            EntityPath::Tactique { tactique, .. } => {
                self.placements.remove(tactique);
            }
            EntityPath::Placement { placement, .. } => {
                self.creatifs.remove(placement);
            }
            EntityPath::Creatif { .. } => {}
        }
    }
}

fn ids_of<T: PlanEntity>(items: &[T]) -> Vec<EntityId> {
    items.iter().map(|item| item.id().clone()).collect()
}

fn find<T: PlanEntity>(items: &[T], id: &EntityId) -> Option<T> {
    items.iter().find(|item| item.id() == id).cloned()
}

fn find_mut<'a, T: PlanEntity>(items: Option<&'a mut Vec<T>>, id: &EntityId) -> Option<&'a mut T> {
    items?.iter_mut().find(|item| item.id() == id)
}

fn push_sorted<T: PlanEntity>(items: &mut Vec<T>, item: T) {
    items.push(item);
    items.sort_by_key(T::order);
}

fn retain_others<T: PlanEntity>(items: Option<&mut Vec<T>>, id: &EntityId) {
    if let Some(items) = items {
        items.retain(|item| item.id() != id);
    }
}

fn renumber_list<T: PlanEntity>(items: Option<&mut Vec<T>>) -> Vec<(EntityId, u32)> {
    items.map(|items| renumber(items)).unwrap_or_default()
}
