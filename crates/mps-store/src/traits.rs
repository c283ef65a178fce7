//! The document store contract.
//!
//! Every call is scoped by the full ancestor path: the [`PlanContext`]
//! (client, campaign, version, onglet) plus the entity ids above the target.
//! Reads return entities ordered by their order field, ascending.
//!
//! The store owns the persisted schema; callers only ever send partial
//! field maps and never assume more than last-write-wins semantics.

use std::future::Future;

use mps_model::{Creatif, EntityId, FieldMap, Placement, PlanContext, Section, Tactique};

use crate::error::Result;
use crate::types::{NamedItem, Shortcode};

/// Read and write access to the campaign hierarchy.
pub trait PlanStore: Send + Sync {
    // =========================================================================
    // READS
    // =========================================================================

    fn get_sections(&self, ctx: &PlanContext) -> impl Future<Output = Result<Vec<Section>>> + Send;

    fn get_tactiques(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
    ) -> impl Future<Output = Result<Vec<Tactique>>> + Send;

    fn get_placements(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
    ) -> impl Future<Output = Result<Vec<Placement>>> + Send;

    fn get_creatifs(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
        placement_id: &EntityId,
    ) -> impl Future<Output = Result<Vec<Creatif>>> + Send;

    fn list_campaigns(&self, client_id: &str)
    -> impl Future<Output = Result<Vec<NamedItem>>> + Send;

    fn list_versions(
        &self,
        client_id: &str,
        campaign_id: &str,
    ) -> impl Future<Output = Result<Vec<NamedItem>>> + Send;

    fn list_onglets(
        &self,
        client_id: &str,
        campaign_id: &str,
        version_id: &str,
    ) -> impl Future<Output = Result<Vec<NamedItem>>> + Send;

    fn get_shortcode(&self, id: &str) -> impl Future<Output = Result<Option<Shortcode>>> + Send;

    // =========================================================================
    // ADDS (return the id assigned by the store)
    // =========================================================================

    fn add_section(
        &self,
        ctx: &PlanContext,
        section: Section,
    ) -> impl Future<Output = Result<EntityId>> + Send;

    fn add_tactique(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique: Tactique,
    ) -> impl Future<Output = Result<EntityId>> + Send;

    fn add_placement(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
        placement: Placement,
    ) -> impl Future<Output = Result<EntityId>> + Send;

    fn add_creatif(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
        placement_id: &EntityId,
        creatif: Creatif,
    ) -> impl Future<Output = Result<EntityId>> + Send;

    // =========================================================================
    // UPDATES (partial field maps)
    // =========================================================================

    fn update_section(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        changes: &FieldMap,
    ) -> impl Future<Output = Result<()>> + Send;

    fn update_tactique(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
        changes: &FieldMap,
    ) -> impl Future<Output = Result<()>> + Send;

    fn update_placement(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
        placement_id: &EntityId,
        changes: &FieldMap,
    ) -> impl Future<Output = Result<()>> + Send;

    fn update_creatif(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
        placement_id: &EntityId,
        creatif_id: &EntityId,
        changes: &FieldMap,
    ) -> impl Future<Output = Result<()>> + Send;

    // =========================================================================
    // DELETES (cascade to descendants)
    // =========================================================================

    fn delete_section(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_tactique(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_placement(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
        placement_id: &EntityId,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_creatif(
        &self,
        ctx: &PlanContext,
        section_id: &EntityId,
        tactique_id: &EntityId,
        placement_id: &EntityId,
        creatif_id: &EntityId,
    ) -> impl Future<Output = Result<()>> + Send;
}
