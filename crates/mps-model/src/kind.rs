//! Entity kinds of the content hierarchy.
//!
//! The hierarchy is fixed: Section → Tactique → Placement → Créatif.
//! Each kind knows its depth, its neighbours, and the storage keys of its
//! structural fields.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One level of the Section → Tactique → Placement → Créatif hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Section,
    Tactique,
    Placement,
    Creatif,
}

impl EntityKind {
    /// All kinds, coarse to fine.
    pub const ALL: [EntityKind; 4] = [
        Self::Section,
        Self::Tactique,
        Self::Placement,
        Self::Creatif,
    ];

    /// Number of ancestors an entity of this kind has (0 for sections).
    pub fn depth(self) -> usize {
        match self {
            Self::Section => 0,
            Self::Tactique => 1,
            Self::Placement => 2,
            Self::Creatif => 3,
        }
    }

    /// Kind of the direct parent, if any.
    pub fn parent(self) -> Option<Self> {
        match self {
            Self::Section => None,
            Self::Tactique => Some(Self::Section),
            Self::Placement => Some(Self::Tactique),
            Self::Creatif => Some(Self::Placement),
        }
    }

    /// Kind of the direct children, if any.
    pub fn child(self) -> Option<Self> {
        match self {
            Self::Section => Some(Self::Tactique),
            Self::Tactique => Some(Self::Placement),
            Self::Placement => Some(Self::Creatif),
            Self::Creatif => None,
        }
    }

    /// Storage key of the order field.
    pub fn order_key(self) -> &'static str {
        match self {
            Self::Section => "SECTION_Order",
            Self::Tactique => "TC_Order",
            Self::Placement => "PL_Order",
            Self::Creatif => "CR_Order",
        }
    }

    /// Storage key of the display label.
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Section => "SECTION_Name",
            Self::Tactique => "TC_Label",
            Self::Placement => "PL_Label",
            Self::Creatif => "CR_Label",
        }
    }

    /// Storage key of the parent foreign key, if any.
    pub fn parent_key(self) -> Option<&'static str> {
        match self {
            Self::Section => None,
            Self::Tactique => Some("TC_SectionId"),
            Self::Placement => Some("PL_TactiqueId"),
            Self::Creatif => Some("CR_PlacementId"),
        }
    }

    /// Lowercase identifier used in messages and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Tactique => "tactique",
            Self::Placement => "placement",
            Self::Creatif => "creatif",
        }
    }

    /// Parse a kind from its lowercase identifier.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "section" => Some(Self::Section),
            "tactique" => Some(Self::Tactique),
            "placement" => Some(Self::Placement),
            "creatif" | "créatif" => Some(Self::Creatif),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_and_child_are_inverse() {
        for kind in EntityKind::ALL {
            if let Some(child) = kind.child() {
                assert_eq!(child.parent(), Some(kind));
                assert_eq!(child.depth(), kind.depth() + 1);
            }
        }
    }

    #[test]
    fn parse_accepts_accented_creatif() {
        assert_eq!(EntityKind::parse("Créatif"), Some(EntityKind::Creatif));
        assert_eq!(EntityKind::parse("onglet"), None);
    }
}
