//! Path-driven dispatch onto the type-specific store calls.

use mps_model::{Entity, EntityId, EntityPath, FieldMap, ModelError, PlanContext};

use crate::error::Result;
use crate::traits::PlanStore;

/// Send a partial update to the store call matching the entity's kind.
pub async fn update_entity<S: PlanStore>(
    store: &S,
    ctx: &PlanContext,
    path: &EntityPath,
    changes: &FieldMap,
) -> Result<()> {
    match path {
        EntityPath::Section { section } => store.update_section(ctx, section, changes).await,
        EntityPath::Tactique { section, tactique } => {
            store.update_tactique(ctx, section, tactique, changes).await
        }
        EntityPath::Placement {
            section,
            tactique,
            placement,
        } => {
            store
                .update_placement(ctx, section, tactique, placement, changes)
                .await
        }
        EntityPath::Creatif {
            section,
            tactique,
            placement,
            creatif,
        } => {
            store
                .update_creatif(ctx, section, tactique, placement, creatif, changes)
                .await
        }
    }
}

/// Delete the entity at `path` (and, store-side, its descendants).
pub async fn delete_entity<S: PlanStore>(
    store: &S,
    ctx: &PlanContext,
    path: &EntityPath,
) -> Result<()> {
    match path {
        EntityPath::Section { section } => store.delete_section(ctx, section).await,
        EntityPath::Tactique { section, tactique } => {
            store.delete_tactique(ctx, section, tactique).await
        }
        EntityPath::Placement {
            section,
            tactique,
            placement,
        } => {
            store
                .delete_placement(ctx, section, tactique, placement)
                .await
        }
        EntityPath::Creatif {
            section,
            tactique,
            placement,
            creatif,
        } => {
            store
                .delete_creatif(ctx, section, tactique, placement, creatif)
                .await
        }
    }
}

/// Add `entity` under `parent` (a section when `parent` is `None`).
///
/// Returns the id the store assigned.
pub async fn add_entity<S: PlanStore>(
    store: &S,
    ctx: &PlanContext,
    parent: Option<&EntityPath>,
    entity: Entity,
) -> Result<EntityId> {
    let mismatch = |entity: &Entity| ModelError::MalformedPath {
        kind: entity.kind().as_str(),
        expected: entity.kind().depth(),
        found: parent.map_or(0, |p| p.kind().depth() + 1),
    };
    match (parent, entity) {
        (None, Entity::Section(section)) => store.add_section(ctx, section).await,
        (Some(EntityPath::Section { section }), Entity::Tactique(tactique)) => {
            store.add_tactique(ctx, section, tactique).await
        }
        (Some(EntityPath::Tactique { section, tactique }), Entity::Placement(placement)) => {
            store.add_placement(ctx, section, tactique, placement).await
        }
        (
            Some(EntityPath::Placement {
                section,
                tactique,
                placement,
            }),
            Entity::Creatif(creatif),
        ) => {
            store
                .add_creatif(ctx, section, tactique, placement, creatif)
                .await
        }
        (_, entity) => Err(mismatch(&entity).into()),
    }
}
