//! Table engine facade.
//!
//! [`TableEngine`] owns the canonical plan of one onglet together with all
//! local editing state: pending changes, the saved overlay, open cells,
//! expansion and row selection. Reads go through the row projector; writes
//! land in the pending-change store until a save sends them to the
//! [`PlanStore`].
//!
//! # Save lifecycle
//!
//! ```text
//! begin_save ──► dispatch_batch (await) ──► finish_save
//!     │                                         │
//!     └── SaveInProgress while in flight        └── successes → overlay, failures → policy
//! ```
//!
//! [`TableEngine::save_all_changes`] runs the three steps in sequence. Hosts
//! that keep the UI live during the await can drive them separately.

use std::collections::{BTreeMap, BTreeSet};

use mps_model::{
    EntityId, EntityKind, EntityPath, FieldMap, FieldValue, ModelError, PlanContext, PlanData,
    Removal,
};
use mps_store::{PlanStore, load_plan, update_entity};

use crate::bulk::{self, BulkEdit, is_copy_excluded};
use crate::cell::{CellEditController, CellKey, CellPosition, EditKey, GridSize, KeyOutcome};
use crate::columns::{Column, ColumnCatalog, DefaultColumns};
use crate::commit::{BatchEntry, CommitReport, SaveBatch, dispatch_batch};
use crate::config::{FailurePolicy, TableConfig};
use crate::error::{Result, TableError};
use crate::overlay::SavedOverlay;
use crate::pending::PendingChangeStore;
use crate::projector::{baseline_value, effective_fields, effective_value, project_rows};
use crate::row::TableRow;

/// Editing state for one onglet.
#[derive(Debug)]
pub struct TableEngine<C = DefaultColumns> {
    ctx: PlanContext,
    config: TableConfig,
    catalog: C,

    plan: PlanData,
    /// Bumped every time canonical data is replaced.
    canonical_version: u64,

    pending: PendingChangeStore,
    overlay: SavedOverlay,
    cells: CellEditController,

    selected_level: EntityKind,
    expanded: BTreeSet<EntityId>,
    selected_rows: BTreeSet<EntityId>,

    in_flight: Option<u64>,
    last_generation: u64,
    last_error: Option<String>,
}

impl TableEngine<DefaultColumns> {
    /// Engine with the built-in columns and default configuration.
    pub fn new(ctx: PlanContext, plan: PlanData) -> Self {
        Self::with_catalog(ctx, plan, DefaultColumns)
    }
}

impl<C: ColumnCatalog> TableEngine<C> {
    pub fn with_catalog(ctx: PlanContext, plan: PlanData, catalog: C) -> Self {
        Self {
            ctx,
            config: TableConfig::default(),
            catalog,
            plan,
            canonical_version: 0,
            pending: PendingChangeStore::new(),
            overlay: SavedOverlay::new(),
            cells: CellEditController::new(),
            selected_level: EntityKind::Section,
            expanded: BTreeSet::new(),
            selected_rows: BTreeSet::new(),
            in_flight: None,
            last_generation: 0,
            last_error: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub fn context(&self) -> &PlanContext {
        &self.ctx
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn plan(&self) -> &PlanData {
        &self.plan
    }

    pub fn pending(&self) -> &PendingChangeStore {
        &self.pending
    }

    pub fn overlay(&self) -> &SavedOverlay {
        &self.overlay
    }

    pub fn cells(&self) -> &CellEditController {
        &self.cells
    }

    pub fn canonical_version(&self) -> u64 {
        self.canonical_version
    }

    pub fn selected_level(&self) -> EntityKind {
        self.selected_level
    }

    /// Visible rows, projected from canonical data and local edits.
    pub fn rows(&self) -> Vec<TableRow> {
        project_rows(
            &self.plan,
            &self.pending,
            &self.overlay,
            self.selected_level,
            &self.expanded,
        )
    }

    /// Columns of the editable level.
    pub fn columns(&self) -> Vec<Column> {
        self.catalog.columns_for_level(self.selected_level)
    }

    pub fn effective_value(&self, id: &EntityId, field: &str) -> Option<FieldValue> {
        let path = self.plan.locate(id)?;
        effective_value(&self.plan, &self.pending, &self.overlay, &path, field)
    }

    pub fn effective_fields(&self, id: &EntityId) -> Option<FieldMap> {
        let path = self.plan.locate(id)?;
        effective_fields(&self.plan, &self.pending, &self.overlay, &path)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Banner text of the last failed operation.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    fn locate(&self, id: &EntityId) -> Result<EntityPath> {
        self.plan
            .locate(id)
            .ok_or_else(|| ModelError::EntityNotFound(id.to_string()).into())
    }

    fn fail<T>(&mut self, error: TableError) -> Result<T> {
        self.last_error = Some(error.user_message());
        Err(error)
    }

    // =========================================================================
    // EDITS
    // =========================================================================

    /// Record an edit of one cell.
    ///
    /// Values are not validated here, but structural fields are refused.
    pub fn update_cell(&mut self, id: &EntityId, field: &str, value: FieldValue) -> Result<()> {
        if is_copy_excluded(field) {
            return self.fail(TableError::StructuralField {
                entity_id: id.clone(),
                field: field.to_string(),
            });
        }
        let path = self.locate(id)?;
        let baseline = baseline_value(&self.plan, &self.overlay, &path, field);
        tracing::debug!(entity = %id, field, "cell updated");
        self.pending.update_cell(id, field, value, baseline.as_ref());
        Ok(())
    }

    /// Set `field` to `value` on every listed entity. Returns how many were found.
    pub fn bulk_edit(&mut self, field: &str, value: FieldValue, ids: &[EntityId]) -> usize {
        self.apply_bulk(bulk::bulk_edit(field, value, ids))
    }

    /// [`bulk_edit`](Self::bulk_edit) over the selected rows.
    pub fn bulk_edit_selected(&mut self, field: &str, value: FieldValue) -> usize {
        let ids: Vec<EntityId> = self.selected_rows.iter().cloned().collect();
        self.bulk_edit(field, value, &ids)
    }

    /// Copy the effective `field` of `from` to every target.
    pub fn fill_down(&mut self, from: &EntityId, field: &str, to: &[EntityId]) -> Result<usize> {
        let source = self
            .effective_fields(from)
            .ok_or_else(|| ModelError::EntityNotFound(from.to_string()))?;
        Ok(self.apply_bulk(bulk::fill_down(from, &source, field, to)))
    }

    /// Copy every copyable field of `from` to the targets of the same kind.
    pub fn copy_values(&mut self, from: &EntityId, to: &[EntityId]) -> Result<usize> {
        let path = self.locate(from)?;
        let source = effective_fields(&self.plan, &self.pending, &self.overlay, &path)
            .ok_or_else(|| ModelError::EntityNotFound(from.to_string()))?;
        let targets: Vec<(&EntityId, EntityKind)> = to
            .iter()
            .filter_map(|id| self.plan.locate(id).map(|p| (id, p.kind())))
            .collect();
        let edit = bulk::copy_values(from, path.kind(), &source, targets);
        Ok(self.apply_bulk(edit))
    }

    fn apply_bulk(&mut self, mut edit: BulkEdit) -> usize {
        edit.changes.retain(|field, _| {
            let structural = is_copy_excluded(field);
            if structural {
                tracing::warn!(field = %field, "structural field skipped in bulk edit");
            }
            !structural
        });
        if edit.is_empty() {
            return 0;
        }
        let mut located = BTreeMap::new();
        for id in &edit.targets {
            match self.plan.locate(id) {
                Some(path) => {
                    located.insert(id.clone(), path);
                }
                None => tracing::warn!(entity = %id, "bulk target not found, skipped"),
            }
        }

        let plan = &self.plan;
        let overlay = &self.overlay;
        for (field, value) in &edit.changes {
            self.pending.bulk_edit(field, value, located.keys(), |id| {
                located
                    .get(id)
                    .and_then(|path| baseline_value(plan, overlay, path, field))
            });
            for (id, path) in &located {
                if let Some(column) = self.catalog.column(path.kind(), field) {
                    let key = CellKey::new(id.clone(), field.as_str());
                    self.cells.revalidate(&key, &column, value);
                }
            }
        }
        tracing::debug!(
            fields = edit.changes.len(),
            targets = located.len(),
            "bulk edit applied"
        );
        located.len()
    }

    // =========================================================================
    // CELL EDITING
    // =========================================================================

    fn grid(&self) -> GridSize {
        GridSize {
            rows: self.rows().len(),
            columns: self.columns().len(),
        }
    }

    /// Key of the cell at a grid position.
    pub fn cell_key_at(&self, position: CellPosition) -> Option<CellKey> {
        let rows = self.rows();
        let row = rows.get(position.row)?;
        let column = self.columns().into_iter().nth(position.column)?;
        Some(CellKey::new(row.id().clone(), column.key))
    }

    /// Open the cell at `position`. Silently refuses non-editable cells.
    pub fn start_cell_edit(&mut self, position: CellPosition) -> bool {
        let rows = self.rows();
        let columns = self.columns();
        let (Some(row), Some(column)) = (rows.get(position.row), columns.get(position.column))
        else {
            return false;
        };
        let key = CellKey::new(row.id().clone(), column.key.clone());
        let current = row.value(&column.key).cloned().unwrap_or_default();
        self.cells
            .start_edit(key, position, column, row.is_editable, current)
    }

    /// Type a new value into an open cell.
    ///
    /// The value reaches the pending changes even when invalid; the return
    /// value tells whether it passed validation.
    pub fn change_cell(&mut self, key: &CellKey, value: FieldValue) -> Result<bool> {
        let valid = self
            .cells
            .change_value(key, value.clone())
            .ok_or_else(|| TableError::NotEditing {
                entity_id: key.entity_id.clone(),
                field: key.field.clone(),
            })?;
        self.update_cell(&key.entity_id, &key.field, value)?;
        Ok(valid)
    }

    /// Close an open cell, keeping what was typed.
    pub fn finish_cell_edit(&mut self, key: &CellKey) -> bool {
        self.cells.finish_edit(key).is_some()
    }

    /// Route a key press to an open cell.
    pub fn handle_key(&mut self, key: &CellKey, press: EditKey) -> Result<KeyOutcome> {
        let grid = self.grid();
        let outcome = self.cells.handle_key(key, press, grid);
        match &outcome {
            KeyOutcome::Reverted { restore } => {
                self.update_cell(&key.entity_id, &key.field, restore.clone())?;
            }
            KeyOutcome::Committed { next } => {
                if self.cell_key_at(*next).as_ref() != Some(key) {
                    self.start_cell_edit(*next);
                }
            }
            KeyOutcome::Ignored => {}
        }
        Ok(outcome)
    }

    // =========================================================================
    // SAVE
    // =========================================================================

    /// Snapshot the pending changes into a batch and mark it in flight.
    ///
    /// Returns `Ok(None)` when there is nothing to save.
    pub fn begin_save(&mut self) -> Result<Option<SaveBatch>> {
        if let Some(generation) = self.in_flight {
            return Err(TableError::SaveInProgress { generation });
        }
        self.ctx.require()?;
        let invalid = self.cells.invalid_count();
        if self.config.block_save_on_invalid && invalid > 0 {
            return Err(TableError::InvalidCells { count: invalid });
        }
        if self.pending.is_empty() {
            return Ok(None);
        }

        self.last_generation += 1;
        let generation = self.last_generation;
        let entries: Vec<BatchEntry> = self
            .pending
            .snapshot()
            .into_iter()
            .map(|(id, changes)| BatchEntry {
                path: self.plan.locate(&id),
                id,
                changes,
            })
            .collect();
        self.in_flight = Some(generation);
        tracing::info!(batch = generation, entities = entries.len(), "save started");
        Ok(Some(SaveBatch {
            generation,
            entries,
        }))
    }

    /// Apply the outcome of the batch in flight.
    ///
    /// Successful entities move from pending changes to the saved overlay;
    /// fields edited again while the batch was in flight stay pending.
    /// Failed entities follow the configured [`FailurePolicy`].
    pub fn finish_save(&mut self, report: &CommitReport) -> Result<()> {
        if self.in_flight != Some(report.generation) {
            return Err(TableError::StaleBatch {
                expected: self.in_flight,
                received: report.generation,
            });
        }
        self.in_flight = None;

        let stamp = self.canonical_version + 1;
        for result in &report.results {
            if result.is_success() {
                self.overlay.record(&result.id, &result.changes, stamp);
                self.pending.settle(&result.id, &result.changes);
            } else if self.config.failure_policy == FailurePolicy::DiscardAttempted {
                self.pending.settle(&result.id, &result.changes);
            }
        }

        if report.is_success() {
            self.cells.clear();
            if self.config.clear_selection_on_save {
                self.selected_rows.clear();
            }
            self.last_error = None;
        } else {
            self.last_error = report.error_summary();
        }
        Ok(())
    }

    /// Save every pending change and wait for the outcome.
    pub async fn save_all_changes<S: PlanStore>(&mut self, store: &S) -> Result<CommitReport> {
        let batch = match self.begin_save() {
            Ok(Some(batch)) => batch,
            Ok(None) => return Ok(CommitReport::empty()),
            Err(error) => return self.fail(error),
        };
        let report = dispatch_batch(store, &self.ctx, &batch).await;
        self.finish_save(&report)?;

        if !report.is_success() && self.config.refresh_after_failure {
            let banner = self.last_error.clone();
            if let Err(error) = self.refresh(store).await {
                tracing::warn!(%error, "refresh after failed save failed");
            }
            self.last_error = banner.or(self.last_error.take());
        }
        Ok(report)
    }

    /// Drop every pending change, open cell and row selection.
    pub fn cancel_all_changes(&mut self) {
        tracing::debug!(entities = self.pending.len(), "pending changes cancelled");
        self.pending.clear();
        self.cells.clear();
        self.selected_rows.clear();
    }

    /// Switch the editable level. Pending edits do not carry over.
    pub fn set_selected_level(&mut self, level: EntityKind) {
        if level == self.selected_level {
            return;
        }
        self.selected_level = level;
        self.cancel_all_changes();
    }

    // =========================================================================
    // EXPANSION
    // =========================================================================

    fn is_section(&self, id: &EntityId) -> bool {
        self.plan.sections.iter().any(|s| &s.id == id)
    }

    pub fn is_expanded(&self, section_id: &EntityId) -> bool {
        self.expanded.contains(section_id)
    }

    pub fn expand_section(&mut self, section_id: &EntityId) {
        if self.is_section(section_id) {
            self.expanded.insert(section_id.clone());
        }
    }

    pub fn collapse_section(&mut self, section_id: &EntityId) {
        self.expanded.remove(section_id);
    }

    /// Flip a section's expansion. Returns the new state.
    pub fn toggle_section(&mut self, section_id: &EntityId) -> bool {
        if self.expanded.remove(section_id) {
            return false;
        }
        self.expand_section(section_id);
        self.is_expanded(section_id)
    }

    pub fn expand_all(&mut self) {
        self.expanded = self.plan.sections.iter().map(|s| s.id.clone()).collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    // =========================================================================
    // ROW SELECTION
    // =========================================================================

    pub fn selected_rows(&self) -> &BTreeSet<EntityId> {
        &self.selected_rows
    }

    pub fn is_row_selected(&self, id: &EntityId) -> bool {
        self.selected_rows.contains(id)
    }

    /// Select a row of the editable level. Returns whether it was accepted.
    pub fn select_row(&mut self, id: &EntityId) -> bool {
        let editable = self
            .plan
            .locate(id)
            .is_some_and(|path| path.kind() == self.selected_level);
        if editable {
            self.selected_rows.insert(id.clone());
        }
        editable
    }

    pub fn deselect_row(&mut self, id: &EntityId) {
        self.selected_rows.remove(id);
    }

    pub fn toggle_row_selection(&mut self, id: &EntityId) -> bool {
        if self.selected_rows.remove(id) {
            return false;
        }
        self.select_row(id)
    }

    /// Select every visible editable row.
    pub fn select_all_rows(&mut self) {
        let ids: Vec<EntityId> = self
            .rows()
            .into_iter()
            .filter(|row| row.is_editable)
            .map(|row| row.id().clone())
            .collect();
        self.selected_rows.extend(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selected_rows.clear();
    }

    // =========================================================================
    // CANONICAL DATA
    // =========================================================================

    /// Delete an entity and its descendants, in the store and locally.
    ///
    /// Remaining siblings are renumbered densely and their new order is
    /// written back to the store. Order write failures are reported in the
    /// banner but do not undo the deletion.
    pub async fn delete_entity<S: PlanStore>(&mut self, store: &S, id: &EntityId) -> Result<Removal> {
        let path = self.locate(id)?;
        let ready = self.ctx.require().map(|_| ()).map_err(TableError::from);
        if let Err(error) = ready {
            return self.fail(error);
        }
        if let Err(error) = mps_store::delete_entity(store, &self.ctx, &path).await {
            return self.fail(error.into());
        }

        let removal = self.plan.remove_entity(&path)?;
        let gone: BTreeSet<EntityId> = removal.removed.iter().cloned().collect();
        self.pending.retain_ids(|id| !gone.contains(id));
        self.cells.forget(|id| gone.contains(id));
        for removed in &gone {
            self.overlay.remove(removed);
            self.selected_rows.remove(removed);
            self.expanded.remove(removed);
        }

        let order_key = path.kind().order_key();
        let mut failed = 0;
        for (sibling, order) in &removal.renumbered {
            let mut changes = FieldMap::new();
            changes.insert(order_key.to_string(), FieldValue::from(*order));
            if let Err(error) = update_entity(store, &self.ctx, sibling, &changes).await {
                tracing::warn!(entity = %sibling.id(), %error, "order update failed");
                failed += 1;
            }
        }
        if failed > 0 {
            self.last_error = Some(format!(
                "Deleted {id}, but the order of {failed} sibling(s) could not be saved."
            ));
        }
        tracing::info!(
            entity = %id,
            removed = removal.removed.len(),
            renumbered = removal.renumbered.len(),
            "entity deleted"
        );
        Ok(removal)
    }

    /// Reload canonical data from the store.
    pub async fn refresh<S: PlanStore>(&mut self, store: &S) -> Result<()> {
        match load_plan(store, &self.ctx).await {
            Ok(plan) => {
                self.replace_canonical(plan);
                tracing::info!(version = self.canonical_version, "plan refreshed");
                Ok(())
            }
            Err(error) => self.fail(error.into()),
        }
    }

    /// Install new canonical data.
    ///
    /// Saved-overlay entries stamped at or below the new version are
    /// dropped, local state for vanished entities is forgotten and pending
    /// fields that now match their baseline are pruned.
    pub fn replace_canonical(&mut self, plan: PlanData) {
        self.plan = plan;
        self.canonical_version += 1;
        let dropped = self.overlay.invalidate(self.canonical_version);

        let paths: BTreeMap<EntityId, EntityPath> = self
            .plan
            .paths()
            .into_iter()
            .map(|path| (path.id().clone(), path))
            .collect();
        self.pending.retain_ids(|id| paths.contains_key(id));
        self.cells.forget(|id| !paths.contains_key(id));
        self.selected_rows.retain(|id| paths.contains_key(id));
        self.expanded.retain(|id| paths.contains_key(id));

        let plan = &self.plan;
        let overlay = &self.overlay;
        self.pending.prune(|id, field, value| {
            paths
                .get(id)
                .and_then(|path| baseline_value(plan, overlay, path, field))
                .as_ref()
                == Some(value)
        });
        tracing::debug!(
            version = self.canonical_version,
            overlay_dropped = dropped,
            "canonical data replaced"
        );
    }
}
