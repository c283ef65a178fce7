//! Data model for the media plan editor.
//!
//! A campaign version is split into onglets (tabs); each onglet holds a
//! four-level content hierarchy:
//!
//! ```text
//! Section → Tactique → Placement → Créatif
//! ```
//!
//! This crate provides:
//!
//! - **Entities** (`entity`): typed structs per level plus the tagged [`Entity`] union
//! - **Paths** (`path`): ancestor lists and typed full paths
//! - **Plan data** (`plan`): canonical maps for one onglet, local removal and insertion
//! - **Ordering** (`ordering`): dense `0..N-1` sibling ordering
//! - **Context** (`context`): client / campaign / version / onglet identifiers

pub mod context;
pub mod entity;
pub mod error;
pub mod fields;
pub mod ids;
pub mod kind;
pub mod ordering;
pub mod path;
pub mod plan;

pub use context::PlanContext;
pub use entity::{Creatif, Entity, PlanEntity, Placement, Section, Tactique};
pub use error::{ModelError, Result};
pub use fields::{FieldMap, FieldValue, TIMESTAMP_KEYS, display_value, parse_loose};
pub use ids::EntityId;
pub use kind::EntityKind;
pub use ordering::{is_dense, next_order, renumber};
pub use path::{EntityPath, HierarchyPath};
pub use plan::{PlanData, Removal};
