//! Plan entities.
//!
//! Each level of the hierarchy has a typed struct whose serde names match the
//! storage keys used by the document store (`SECTION_Name`, `TC_Budget`, ...).
//! Fields the model does not know about are kept in `extra` so that edits to
//! arbitrary columns round-trip unchanged.
//!
//! [`Entity`] is the tagged union used wherever several kinds travel
//! together; its discriminant is set when the data is ingested and never
//! inferred from field presence afterwards.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, Result};
use crate::fields::FieldMap;
use crate::ids::EntityId;
use crate::kind::EntityKind;

// =============================================================================
// ENTITY TRAIT
// =============================================================================

/// Behaviour shared by every entity struct.
pub trait PlanEntity: Clone + Serialize + DeserializeOwned {
    /// Hierarchy level of this entity type.
    const KIND: EntityKind;

    fn id(&self) -> &EntityId;

    fn order(&self) -> u32;

    fn set_order(&mut self, order: u32);

    fn label(&self) -> &str;

    /// Point the parent foreign key at `parent`. Sections have none.
    fn set_parent(&mut self, parent: &EntityId);

    /// All fields of the entity keyed by storage key.
    fn to_fields(&self) -> FieldMap {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => FieldMap::new(),
        }
    }

    /// Merge a partial field map into the entity.
    ///
    /// Changes are applied one key at a time so a type mismatch names the
    /// offending field. The entity is left untouched on error.
    fn apply_fields(&mut self, changes: &FieldMap) -> Result<()> {
        let mut updated = self.clone();
        for (key, value) in changes {
            if key == "id" {
                return Err(ModelError::InvalidField {
                    field: key.clone(),
                    message: "the id of an entity cannot be changed".to_string(),
                });
            }
            let mut fields = updated.to_fields();
            fields.insert(key.clone(), value.clone());
            updated = serde_json::from_value(Value::Object(fields)).map_err(|e| {
                ModelError::InvalidField {
                    field: key.clone(),
                    message: e.to_string(),
                }
            })?;
        }
        *self = updated;
        Ok(())
    }
}

// =============================================================================
// SECTION
// =============================================================================

/// Top-level grouping inside an onglet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: EntityId,
    #[serde(rename = "SECTION_Name")]
    pub name: String,
    #[serde(rename = "SECTION_Order")]
    pub order: u32,
    #[serde(rename = "SECTION_Color", default)]
    pub color: Option<String>,
    #[serde(rename = "SECTION_Budget", default)]
    pub budget: f64,
    #[serde(flatten)]
    pub extra: FieldMap,
}

impl Section {
    pub fn new(id: EntityId, name: impl Into<String>, order: u32) -> Self {
        Self {
            id,
            name: name.into(),
            order,
            color: None,
            budget: 0.0,
            extra: FieldMap::new(),
        }
    }
}

impl PlanEntity for Section {
    const KIND: EntityKind = EntityKind::Section;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn set_parent(&mut self, _parent: &EntityId) {}
}

// =============================================================================
// TACTIQUE
// =============================================================================

/// Media tactic, child of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tactique {
    pub id: EntityId,
    #[serde(rename = "TC_Label")]
    pub label: String,
    #[serde(rename = "TC_Budget", default)]
    pub budget: f64,
    #[serde(rename = "TC_Order")]
    pub order: u32,
    #[serde(rename = "TC_SectionId")]
    pub section_id: EntityId,
    #[serde(rename = "TC_Status", default)]
    pub status: Option<String>,
    #[serde(rename = "TC_StartDate", default)]
    pub start_date: Option<String>,
    #[serde(rename = "TC_EndDate", default)]
    pub end_date: Option<String>,
    #[serde(rename = "TC_Media_Type", default)]
    pub media_type: Option<String>,
    #[serde(rename = "TC_Publisher", default)]
    pub publisher: Option<String>,
    #[serde(rename = "TC_Inventory", default)]
    pub inventory: Option<String>,
    #[serde(flatten)]
    pub extra: FieldMap,
}

impl Tactique {
    pub fn new(id: EntityId, section_id: EntityId, label: impl Into<String>, order: u32) -> Self {
        Self {
            id,
            label: label.into(),
            budget: 0.0,
            order,
            section_id,
            status: None,
            start_date: None,
            end_date: None,
            media_type: None,
            publisher: None,
            inventory: None,
            extra: FieldMap::new(),
        }
    }
}

impl PlanEntity for Tactique {
    const KIND: EntityKind = EntityKind::Tactique;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn set_parent(&mut self, parent: &EntityId) {
        self.section_id = parent.clone();
    }
}

// =============================================================================
// PLACEMENT
// =============================================================================

/// Placement, child of a tactique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: EntityId,
    #[serde(rename = "PL_Label")]
    pub label: String,
    #[serde(rename = "PL_Order")]
    pub order: u32,
    #[serde(rename = "PL_TactiqueId")]
    pub tactique_id: EntityId,
    #[serde(rename = "PL_Taxonomy_Values", default)]
    pub taxonomy_values: FieldMap,
    #[serde(rename = "PL_Generated_Taxonomies", default)]
    pub generated_taxonomies: FieldMap,
    #[serde(flatten)]
    pub extra: FieldMap,
}

impl Placement {
    pub fn new(id: EntityId, tactique_id: EntityId, label: impl Into<String>, order: u32) -> Self {
        Self {
            id,
            label: label.into(),
            order,
            tactique_id,
            taxonomy_values: FieldMap::new(),
            generated_taxonomies: FieldMap::new(),
            extra: FieldMap::new(),
        }
    }
}

impl PlanEntity for Placement {
    const KIND: EntityKind = EntityKind::Placement;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn set_parent(&mut self, parent: &EntityId) {
        self.tactique_id = parent.clone();
    }
}

// =============================================================================
// CREATIF
// =============================================================================

/// Creative, child of a placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creatif {
    pub id: EntityId,
    #[serde(rename = "CR_Label")]
    pub label: String,
    #[serde(rename = "CR_Order")]
    pub order: u32,
    #[serde(rename = "CR_PlacementId")]
    pub placement_id: EntityId,
    #[serde(rename = "CR_Taxonomy_Values", default)]
    pub taxonomy_values: FieldMap,
    #[serde(rename = "CR_Generated_Taxonomies", default)]
    pub generated_taxonomies: FieldMap,
    #[serde(flatten)]
    pub extra: FieldMap,
}

impl Creatif {
    pub fn new(id: EntityId, placement_id: EntityId, label: impl Into<String>, order: u32) -> Self {
        Self {
            id,
            label: label.into(),
            order,
            placement_id,
            taxonomy_values: FieldMap::new(),
            generated_taxonomies: FieldMap::new(),
            extra: FieldMap::new(),
        }
    }
}

impl PlanEntity for Creatif {
    const KIND: EntityKind = EntityKind::Creatif;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn set_parent(&mut self, parent: &EntityId) {
        self.placement_id = parent.clone();
    }
}

// =============================================================================
// TAGGED UNION
// =============================================================================

/// Any plan entity, tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Section(Section),
    Tactique(Tactique),
    Placement(Placement),
    Creatif(Creatif),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Section(_) => EntityKind::Section,
            Self::Tactique(_) => EntityKind::Tactique,
            Self::Placement(_) => EntityKind::Placement,
            Self::Creatif(_) => EntityKind::Creatif,
        }
    }

    pub fn id(&self) -> &EntityId {
        match self {
            Self::Section(e) => e.id(),
            Self::Tactique(e) => e.id(),
            Self::Placement(e) => e.id(),
            Self::Creatif(e) => e.id(),
        }
    }

    pub fn order(&self) -> u32 {
        match self {
            Self::Section(e) => e.order(),
            Self::Tactique(e) => e.order(),
            Self::Placement(e) => e.order(),
            Self::Creatif(e) => e.order(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Section(e) => e.label(),
            Self::Tactique(e) => e.label(),
            Self::Placement(e) => e.label(),
            Self::Creatif(e) => e.label(),
        }
    }

    pub fn to_fields(&self) -> FieldMap {
        match self {
            Self::Section(e) => e.to_fields(),
            Self::Tactique(e) => e.to_fields(),
            Self::Placement(e) => e.to_fields(),
            Self::Creatif(e) => e.to_fields(),
        }
    }

    /// Replace the id, e.g. with the one a store assigned to a copy.
    pub fn set_id(&mut self, id: EntityId) {
        match self {
            Self::Section(e) => e.id = id,
            Self::Tactique(e) => e.id = id,
            Self::Placement(e) => e.id = id,
            Self::Creatif(e) => e.id = id,
        }
    }

    pub fn set_order(&mut self, order: u32) {
        match self {
            Self::Section(e) => e.set_order(order),
            Self::Tactique(e) => e.set_order(order),
            Self::Placement(e) => e.set_order(order),
            Self::Creatif(e) => e.set_order(order),
        }
    }

    pub fn set_parent(&mut self, parent: &EntityId) {
        match self {
            Self::Section(e) => e.set_parent(parent),
            Self::Tactique(e) => e.set_parent(parent),
            Self::Placement(e) => e.set_parent(parent),
            Self::Creatif(e) => e.set_parent(parent),
        }
    }
}

impl From<Section> for Entity {
    fn from(value: Section) -> Self {
        Self::Section(value)
    }
}

impl From<Tactique> for Entity {
    fn from(value: Tactique) -> Self {
        Self::Tactique(value)
    }
}

impl From<Placement> for Entity {
    fn from(value: Placement) -> Self {
        Self::Placement(value)
    }
}

impl From<Creatif> for Entity {
    fn from(value: Creatif) -> Self {
        Self::Creatif(value)
    }
}
