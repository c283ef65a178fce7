//! Hierarchy paths.
//!
//! - [`HierarchyPath`] - ordered ancestor ids of one entity
//! - [`EntityPath`] - typed full path (ancestors plus the entity itself)

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::ids::EntityId;
use crate::kind::EntityKind;

/// Ordered list of ancestor ids, coarse to fine.
///
/// `[]` for a section, `[section]` for a tactique, `[section, tactique]`
/// for a placement and `[section, tactique, placement]` for a créatif.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HierarchyPath(Vec<EntityId>);

impl HierarchyPath {
    /// Path of a top-level entity (no ancestors).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_ids(ids: Vec<EntityId>) -> Self {
        Self(ids)
    }

    /// Path of a child of the entity `id` located at `self`.
    #[must_use]
    pub fn child(&self, id: &EntityId) -> Self {
        let mut ids = self.0.clone();
        ids.push(id.clone());
        Self(ids)
    }

    pub fn ids(&self) -> &[EntityId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ancestor at the depth of `kind` (e.g. the section id at index 0).
    pub fn ancestor(&self, kind: EntityKind) -> Option<&EntityId> {
        self.0.get(kind.depth())
    }

    /// Direct parent id.
    pub fn parent(&self) -> Option<&EntityId> {
        self.0.last()
    }
}

/// Typed path of one entity, carrying every ancestor id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntityPath {
    Section {
        section: EntityId,
    },
    Tactique {
        section: EntityId,
        tactique: EntityId,
    },
    Placement {
        section: EntityId,
        tactique: EntityId,
        placement: EntityId,
    },
    Creatif {
        section: EntityId,
        tactique: EntityId,
        placement: EntityId,
        creatif: EntityId,
    },
}

impl EntityPath {
    /// Build a path from a kind, ancestor path and id.
    pub fn new(kind: EntityKind, ancestors: &HierarchyPath, id: EntityId) -> Result<Self> {
        if ancestors.len() != kind.depth() {
            return Err(ModelError::MalformedPath {
                kind: kind.as_str(),
                expected: kind.depth(),
                found: ancestors.len(),
            });
        }
        let at = |index: usize| ancestors.ids()[index].clone();
        Ok(match kind {
            EntityKind::Section => Self::Section { section: id },
            EntityKind::Tactique => Self::Tactique {
                section: at(0),
                tactique: id,
            },
            EntityKind::Placement => Self::Placement {
                section: at(0),
                tactique: at(1),
                placement: id,
            },
            EntityKind::Creatif => Self::Creatif {
                section: at(0),
                tactique: at(1),
                placement: at(2),
                creatif: id,
            },
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Section { .. } => EntityKind::Section,
            Self::Tactique { .. } => EntityKind::Tactique,
            Self::Placement { .. } => EntityKind::Placement,
            Self::Creatif { .. } => EntityKind::Creatif,
        }
    }

    /// Id of the entity this path points at.
    pub fn id(&self) -> &EntityId {
        match self {
            Self::Section { section } => section,
            Self::Tactique { tactique, .. } => tactique,
            Self::Placement { placement, .. } => placement,
            Self::Creatif { creatif, .. } => creatif,
        }
    }

    pub fn section_id(&self) -> &EntityId {
        match self {
            Self::Section { section }
            | Self::Tactique { section, .. }
            | Self::Placement { section, .. }
            | Self::Creatif { section, .. } => section,
        }
    }

    pub fn tactique_id(&self) -> Option<&EntityId> {
        match self {
            Self::Section { .. } => None,
            Self::Tactique { tactique, .. }
            | Self::Placement { tactique, .. }
            | Self::Creatif { tactique, .. } => Some(tactique),
        }
    }

    pub fn placement_id(&self) -> Option<&EntityId> {
        match self {
            Self::Placement { placement, .. } | Self::Creatif { placement, .. } => Some(placement),
            _ => None,
        }
    }

    /// Ancestor ids, coarse to fine.
    pub fn ancestors(&self) -> HierarchyPath {
        let mut ids = Vec::with_capacity(3);
        match self {
            Self::Section { .. } => {}
            Self::Tactique { section, .. } => ids.push(section.clone()),
            Self::Placement {
                section, tactique, ..
            } => {
                ids.push(section.clone());
                ids.push(tactique.clone());
            }
            Self::Creatif {
                section,
                tactique,
                placement,
                ..
            } => {
                ids.push(section.clone());
                ids.push(tactique.clone());
                ids.push(placement.clone());
            }
        }
        HierarchyPath::from_ids(ids)
    }

    /// Id of the direct parent, if any.
    pub fn parent_id(&self) -> Option<&EntityId> {
        match self {
            Self::Section { .. } => None,
            Self::Tactique { section, .. } => Some(section),
            Self::Placement { tactique, .. } => Some(tactique),
            Self::Creatif { placement, .. } => Some(placement),
        }
    }

    /// Path of a child entity of this one.
    pub fn child(&self, id: EntityId) -> Option<Self> {
        let kind = self.kind().child()?;
        let ancestors = self.ancestors().child(self.id());
        Self::new(kind, &ancestors, id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> EntityId {
        EntityId::new(value).unwrap()
    }

    #[test]
    fn new_rejects_wrong_depth() {
        let err = EntityPath::new(EntityKind::Placement, &HierarchyPath::root(), id("P1"));
        assert!(matches!(
            err,
            Err(ModelError::MalformedPath {
                expected: 2,
                found: 0,
                ..
            })
        ));
    }

    #[test]
    fn child_extends_ancestors() {
        let tactique = EntityPath::Tactique {
            section: id("S1"),
            tactique: id("T1"),
        };
        let placement = tactique.child(id("P1")).unwrap();
        assert_eq!(placement.kind(), EntityKind::Placement);
        assert_eq!(placement.section_id().as_str(), "S1");
        assert_eq!(placement.parent_id().unwrap().as_str(), "T1");
        assert_eq!(placement.ancestors().ids(), &[id("S1"), id("T1")]);
    }
}
