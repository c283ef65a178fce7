//! Move execution.
//!
//! A move copies each root element, with its whole subtree, under the
//! destination parent and then deletes the original. Copies are appended
//! after the destination's existing children so sibling orders stay dense
//! on both sides. Roots are moved one at a time; a root whose copy fails
//! is left where it was.

use std::collections::HashMap;

use mps_model::{
    Entity, EntityId, EntityPath, FieldMap, ModelError, PlanContext, PlanData, next_order,
};
use mps_store::{PlanStore, add_entity, delete_entity, load_plan, update_entity};
use serde::Serialize;
use serde_json::json;

use crate::cascade::{MoveDestination, MoveTarget};
use crate::error::{MoveError, Result};
use crate::selection::{SelectedItem, SelectionAnalysis};

// =============================================================================
// REPORT
// =============================================================================

/// Outcome of moving one root element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootOutcome {
    pub source_id: EntityId,
    /// Id of the copy, once the root itself was created.
    pub new_id: Option<EntityId>,
    /// Entities created, the root included.
    pub copied: usize,
    pub source_deleted: bool,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<MoveError>,
}

impl RootOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-root results of one move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MoveReport {
    pub results: Vec<RootOutcome>,
    /// Sibling order updates that could not be written after a deletion.
    pub order_failures: usize,
}

impl MoveReport {
    pub fn moved(&self) -> impl Iterator<Item = &RootOutcome> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &RootOutcome> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.order_failures == 0 && self.results.iter().all(RootOutcome::is_success)
    }

    /// One line per failed root, for a banner.
    pub fn error_summary(&self) -> Option<String> {
        let lines: Vec<String> = self
            .failed()
            .filter_map(|r| r.error.as_ref().map(|e| format!("{}: {}", r.source_id, e)))
            .collect();
        (!lines.is_empty()).then(|| lines.join("\n"))
    }
}

fn serialize_error<S: serde::Serializer>(
    error: &Option<MoveError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.serialize_some(&error.to_string()),
        None => serializer.serialize_none(),
    }
}

// =============================================================================
// EXECUTION
// =============================================================================

/// Move the analysed roots under `destination`.
///
/// `plan` is the loaded content of the source onglet `ctx`. The
/// destination onglet is read fresh from the store (or taken from `plan`
/// when it is the same onglet) to compute append positions.
///
/// Selection and destination problems are returned as `Err` before any
/// write; per-root failures are reported in the [`MoveReport`].
pub async fn execute_move<S: PlanStore>(
    store: &S,
    ctx: &PlanContext,
    plan: &PlanData,
    analysis: &SelectionAnalysis,
    destination: &MoveDestination,
) -> Result<MoveReport> {
    ctx.require()?;
    let target_level = match (analysis.can_move, analysis.target_level) {
        (true, Some(level)) => level,
        _ => {
            return Err(MoveError::InvalidSelection {
                message: analysis
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "nothing to move".to_string()),
            });
        }
    };
    let target = destination.resolve(&ctx.client_id, target_level)?;

    let same_onglet = target.ctx == *ctx;
    let mut source = plan.clone();
    let mut remote = if same_onglet {
        None
    } else {
        Some(load_plan(store, &target.ctx).await?)
    };

    {
        let dest = remote.as_ref().unwrap_or(&source);
        if let Some(parent) = &target.parent
            && dest.entity(parent).is_none()
        {
            return Err(MoveError::DestinationNotFound {
                id: parent.id().to_string(),
            });
        }
    }

    tracing::info!(
        roots = analysis.root_elements.len(),
        to = %target.ctx.onglet_id,
        parent = %target.parent.as_ref().map(|p| p.id().to_string()).unwrap_or_default(),
        "moving elements"
    );

    let mut report = MoveReport::default();
    for root in &analysis.root_elements {
        let dest = remote.as_mut().unwrap_or(&mut source);
        let mut outcome = copy_root(store, &target, dest, root, plan).await;

        if outcome.is_success() {
            if let Err(error) = remove_source(store, ctx, &mut source, root, &mut report).await {
                outcome.error = Some(error);
            } else {
                outcome.source_deleted = true;
            }
        }

        match &outcome.error {
            None => tracing::info!(
                id = %root.id,
                new_id = %outcome.new_id.as_ref().map(ToString::to_string).unwrap_or_default(),
                copied = outcome.copied,
                "element moved"
            ),
            Some(error) => tracing::warn!(id = %root.id, error = %error, "element not moved"),
        }
        report.results.push(outcome);
    }
    Ok(report)
}

/// Create a copy of `root` and its descendants under the destination parent.
async fn copy_root<S: PlanStore>(
    store: &S,
    target: &MoveTarget,
    dest: &mut PlanData,
    root: &SelectedItem,
    plan: &PlanData,
) -> RootOutcome {
    let mut outcome = RootOutcome {
        source_id: root.id.clone(),
        new_id: None,
        copied: 0,
        source_deleted: false,
        error: None,
    };

    let Some(root_path) = root.path().filter(|path| plan.entity(path).is_some()) else {
        outcome.error = Some(MoveError::Model(ModelError::EntityNotFound(
            root.id.to_string(),
        )));
        return outcome;
    };

    let parent = target.parent.as_ref();
    let mut mapping: HashMap<EntityId, EntityPath> = HashMap::new();
    let order = next_order(dest.child_count(parent));

    let mut queue = vec![root_path.clone()];
    queue.extend(plan.descendants(&root_path));
    for path in queue {
        let new_parent = if path == root_path {
            parent.cloned()
        } else {
            path.parent_id().and_then(|id| mapping.get(id)).cloned()
        };
        let Some(mut entity) = plan.entity(&path) else {
            continue;
        };
        if path == root_path {
            entity.set_order(order);
        }
        if let Some(new_parent) = &new_parent {
            entity.set_parent(new_parent.id());
        }

        match add_entity(store, &target.ctx, new_parent.as_ref(), entity.clone()).await {
            Ok(new_id) => {
                let new_path = match &new_parent {
                    Some(p) => p.child(new_id.clone()),
                    None => Some(EntityPath::Section {
                        section: new_id.clone(),
                    }),
                };
                let Some(new_path) = new_path else {
                    continue;
                };
                if path == root_path {
                    outcome.new_id = Some(new_id.clone());
                    insert_local(dest, parent, entity, new_id);
                }
                outcome.copied += 1;
                mapping.insert(path.id().clone(), new_path);
            }
            Err(error) => {
                outcome.error = Some(error.into());
                break;
            }
        }
    }

    if outcome.error.is_some()
        && let Some(new_id) = &outcome.new_id
    {
        discard_partial_copy(store, target, dest, new_id).await;
    }
    outcome
}

fn insert_local(dest: &mut PlanData, parent: Option<&EntityPath>, mut entity: Entity, id: EntityId) {
    entity.set_id(id);
    if let Err(error) = dest.insert(parent, entity) {
        tracing::warn!(error = %error, "copied element not tracked locally");
    }
}

/// Remove the half-built copy of a root whose subtree failed to copy.
async fn discard_partial_copy<S: PlanStore>(
    store: &S,
    target: &MoveTarget,
    dest: &mut PlanData,
    new_id: &EntityId,
) {
    let Some(path) = dest.locate(new_id) else {
        return;
    };
    match delete_entity(store, &target.ctx, &path).await {
        Ok(()) => {
            if let Err(error) = dest.remove_entity(&path) {
                tracing::warn!(error = %error, "partial copy not removed locally");
            }
        }
        Err(error) => tracing::warn!(id = %new_id, error = %error, "partial copy left behind"),
    }
}

/// Delete the original root and densify the orders it leaves behind.
async fn remove_source<S: PlanStore>(
    store: &S,
    ctx: &PlanContext,
    source: &mut PlanData,
    root: &SelectedItem,
    report: &mut MoveReport,
) -> Result<()> {
    let path = source
        .locate(&root.id)
        .ok_or_else(|| ModelError::EntityNotFound(root.id.to_string()))?;
    delete_entity(store, ctx, &path)
        .await
        .map_err(|error| MoveError::SourceNotDeleted {
            id: root.id.clone(),
            message: error.to_string(),
        })?;

    let removal = source.remove_entity(&path)?;
    for (sibling, order) in &removal.renumbered {
        let mut changes = FieldMap::new();
        changes.insert(sibling.kind().order_key().to_string(), json!(order));
        if let Err(error) = update_entity(store, ctx, sibling, &changes).await {
            tracing::warn!(id = %sibling.id(), error = %error, "sibling order not updated");
            report.order_failures += 1;
        }
    }
    Ok(())
}
