//! Document store access for media plans.
//!
//! The plan editor never talks to a database directly. Every read and write
//! goes through the [`PlanStore`] trait, which mirrors the hierarchical
//! collections of the backing document store:
//!
//! ```text
//! clients/{client}/campaigns/{campaign}/versions/{version}/onglets/{onglet}
//!     /sections/{section}/tactiques/{tactique}/placements/{placement}/creatifs/{creatif}
//! ```
//!
//! # Features
//!
//! - **Contract** (`traits`): async reads, partial updates, cascading deletes
//! - **Dispatch** (`dispatch`): route a typed [`EntityPath`](mps_model::EntityPath) to the right call
//! - **Loading** (`loader`): read a whole onglet into [`PlanData`](mps_model::PlanData)
//! - **In-memory backend** (`memory`): seedable from JSON, records calls, injects failures

pub mod dispatch;
pub mod error;
pub mod loader;
pub mod memory;
pub mod traits;
pub mod types;

pub use dispatch::{add_entity, delete_entity, update_entity};
pub use error::{Result, StoreError};
pub use loader::load_plan;
pub use memory::{CampaignSeed, InMemoryStore, OngletSeed, StoreCall, StoreSeed, VersionSeed};
pub use traits::PlanStore;
pub use types::{NamedItem, Shortcode};
