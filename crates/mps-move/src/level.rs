//! Destination levels.
//!
//! A move puts root elements under a parent one level up the hierarchy:
//! sections go into an onglet, tactiques into a section, and so on. The
//! destination picker walks the six cascade levels from campaign down to
//! that parent.

use std::fmt;

use mps_model::EntityKind;
use serde::{Deserialize, Serialize};

/// Level of the parent that receives moved elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLevel {
    Onglet,
    Section,
    Tactique,
    Placement,
}

impl TargetLevel {
    /// Destination level for roots of `kind`.
    pub fn for_move(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Section => Self::Onglet,
            EntityKind::Tactique => Self::Section,
            EntityKind::Placement => Self::Tactique,
            EntityKind::Creatif => Self::Placement,
        }
    }

    /// Deepest cascade level the picker must fill.
    pub fn cascade_level(self) -> CascadeLevel {
        match self {
            Self::Onglet => CascadeLevel::Onglet,
            Self::Section => CascadeLevel::Section,
            Self::Tactique => CascadeLevel::Tactique,
            Self::Placement => CascadeLevel::Placement,
        }
    }

    /// Kind of the destination parent entity, `None` for an onglet.
    pub fn parent_kind(self) -> Option<EntityKind> {
        match self {
            Self::Onglet => None,
            Self::Section => Some(EntityKind::Section),
            Self::Tactique => Some(EntityKind::Tactique),
            Self::Placement => Some(EntityKind::Placement),
        }
    }
}

impl fmt::Display for TargetLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cascade_level().fmt(f)
    }
}

/// One step of the destination cascade, coarse to fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CascadeLevel {
    Campaign,
    Version,
    Onglet,
    Section,
    Tactique,
    Placement,
}

impl CascadeLevel {
    pub const ALL: [CascadeLevel; 6] = [
        Self::Campaign,
        Self::Version,
        Self::Onglet,
        Self::Section,
        Self::Tactique,
        Self::Placement,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The level loaded once this one has a selection.
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Levels strictly deeper than this one.
    pub fn deeper(self) -> impl Iterator<Item = CascadeLevel> {
        Self::ALL.into_iter().skip(self.index() + 1)
    }

    /// Entity kind listed at this level; `None` above the content hierarchy.
    pub fn entity_kind(self) -> Option<EntityKind> {
        match self {
            Self::Campaign | Self::Version | Self::Onglet => None,
            Self::Section => Some(EntityKind::Section),
            Self::Tactique => Some(EntityKind::Tactique),
            Self::Placement => Some(EntityKind::Placement),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Campaign => "campaign",
            Self::Version => "version",
            Self::Onglet => "onglet",
            Self::Section => "section",
            Self::Tactique => "tactique",
            Self::Placement => "placement",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == value.trim().to_ascii_lowercase())
    }
}

impl fmt::Display for CascadeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_one_level_up() {
        assert_eq!(TargetLevel::for_move(EntityKind::Section), TargetLevel::Onglet);
        assert_eq!(TargetLevel::for_move(EntityKind::Tactique), TargetLevel::Section);
        for kind in EntityKind::ALL {
            assert_eq!(TargetLevel::for_move(kind).parent_kind(), kind.parent());
        }
    }

    #[test]
    fn cascade_walks_in_order() {
        assert_eq!(CascadeLevel::Campaign.next(), Some(CascadeLevel::Version));
        assert_eq!(CascadeLevel::Placement.next(), None);
        let deeper: Vec<_> = CascadeLevel::Onglet.deeper().collect();
        assert_eq!(
            deeper,
            [CascadeLevel::Section, CascadeLevel::Tactique, CascadeLevel::Placement]
        );
        assert_eq!(CascadeLevel::parse(" Version"), Some(CascadeLevel::Version));
    }
}
