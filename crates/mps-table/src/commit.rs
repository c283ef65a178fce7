//! Commit coordinator.
//!
//! A save takes a snapshot of the pending changes, resolves each entity's
//! full hierarchy path and dispatches one type-specific update per entity.
//! All updates run concurrently and every one of them is awaited, so the
//! outcome is known per entity: a failure never hides the successes that
//! already reached the store.

use futures_util::future::join_all;
use mps_model::{EntityId, EntityKind, EntityPath, FieldMap, ModelError, PlanContext};
use mps_store::{PlanStore, StoreError, update_entity};

/// One entity of a save batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub id: EntityId,
    /// `None` when the entity could not be found in canonical data.
    pub path: Option<EntityPath>,
    pub changes: FieldMap,
}

/// Snapshot of pending changes taken when a save starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveBatch {
    pub generation: u64,
    pub entries: Vec<BatchEntry>,
}

impl SaveBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of one entity update.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityCommitResult {
    pub id: EntityId,
    pub kind: Option<EntityKind>,
    /// The changes that were sent.
    pub changes: FieldMap,
    pub outcome: Result<(), StoreError>,
}

impl EntityCommitResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-entity outcome of a whole save batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReport {
    pub generation: u64,
    pub results: Vec<EntityCommitResult>,
}

impl CommitReport {
    /// Report for a save that had nothing to send.
    pub fn empty() -> Self {
        Self {
            generation: 0,
            results: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &EntityCommitResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &EntityCommitResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(EntityCommitResult::is_success)
    }

    pub fn failed_ids(&self) -> Vec<EntityId> {
        self.failed().map(|r| r.id.clone()).collect()
    }

    /// One-line banner text describing the failures, if any.
    pub fn error_summary(&self) -> Option<String> {
        let failed: Vec<&EntityCommitResult> = self.failed().collect();
        let first = failed.first()?;
        let message = match &first.outcome {
            Err(error) => error.to_string(),
            Ok(()) => String::new(),
        };
        Some(if failed.len() == 1 {
            format!("Could not save {}: {message}", first.id)
        } else {
            format!(
                "Could not save {} of {} entities (first: {}: {message})",
                failed.len(),
                self.results.len(),
                first.id
            )
        })
    }
}

/// Send every entry of `batch` to the store and collect per-entity results.
pub async fn dispatch_batch<S: PlanStore>(
    store: &S,
    ctx: &PlanContext,
    batch: &SaveBatch,
) -> CommitReport {
    let calls = batch.entries.iter().map(|entry| async move {
        let outcome = match &entry.path {
            Some(path) => update_entity(store, ctx, path, &entry.changes).await,
            None => Err(ModelError::EntityNotFound(entry.id.to_string()).into()),
        };
        if let Err(error) = &outcome {
            tracing::warn!(entity = %entry.id, %error, "entity update failed");
        }
        EntityCommitResult {
            id: entry.id.clone(),
            kind: entry.path.as_ref().map(EntityPath::kind),
            changes: entry.changes.clone(),
            outcome,
        }
    });
    let results = join_all(calls).await;

    let report = CommitReport {
        generation: batch.generation,
        results,
    };
    tracing::info!(
        batch = batch.generation,
        saved = report.succeeded().count(),
        failed = report.failed().count(),
        "save batch committed"
    );
    report
}
