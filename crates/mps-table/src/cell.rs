//! Cell edit controller.
//!
//! Tracks which cells are in edit mode, validates typed values against
//! their column, and turns key presses into commit / revert / move
//! decisions. Several cells may be open at once; navigating away from a
//! cell always ends its edit first.
//!
//! The controller never writes pending changes itself. It reports what
//! happened and the engine applies it.

use std::collections::{BTreeMap, BTreeSet};

use mps_model::{EntityId, FieldValue};

use crate::columns::{Column, ColumnKind};

// =============================================================================
// KEYS AND POSITIONS
// =============================================================================

/// Identity of a cell: entity plus field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub entity_id: EntityId,
    pub field: String,
}

impl CellKey {
    pub fn new(entity_id: EntityId, field: impl Into<String>) -> Self {
        Self {
            entity_id,
            field: field.into(),
        }
    }
}

/// Grid coordinates of a cell in the visible rows and current columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellPosition {
    pub row: usize,
    pub column: usize,
}

impl CellPosition {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// Dimensions of the visible grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Keys the controller reacts to while a cell is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Enter,
    ShiftEnter,
    Tab,
    ShiftTab,
    Escape,
    ArrowUp,
    ArrowDown,
}

/// What a key press did to the open cell.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// The edit ended with its current value; focus moved to `next`.
    Committed { next: CellPosition },
    /// The edit was abandoned; `restore` is the value from before the edit.
    Reverted { restore: FieldValue },
    /// The key does not end the edit (or the cell was not open).
    Ignored,
}

// =============================================================================
// CONTROLLER
// =============================================================================

#[derive(Debug, Clone)]
struct EditBuffer {
    position: CellPosition,
    column: Column,
    original: FieldValue,
    current: FieldValue,
    typed: bool,
}

/// Edit-mode bookkeeping for the table.
#[derive(Debug, Clone, Default)]
pub struct CellEditController {
    editing: BTreeMap<CellKey, EditBuffer>,
    invalid: BTreeSet<CellKey>,
    focus: Option<CellPosition>,
}

impl CellEditController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `key` for editing with `current` as its starting value.
    ///
    /// Returns `false`, without changing anything, when the row is not
    /// editable or the column is read-only.
    pub fn start_edit(
        &mut self,
        key: CellKey,
        position: CellPosition,
        column: &Column,
        row_editable: bool,
        current: FieldValue,
    ) -> bool {
        if !row_editable || !column.is_editable() {
            tracing::debug!(entity = %key.entity_id, field = %key.field, "cell is not editable");
            return false;
        }
        self.focus = Some(position);
        self.editing.entry(key).or_insert_with(|| EditBuffer {
            position,
            column: column.clone(),
            original: current.clone(),
            current,
            typed: false,
        });
        true
    }

    /// Replace the buffered value of an open cell.
    ///
    /// Returns whether the value passes its column validation, or `None`
    /// when the cell is not open. Invalid values stay in the buffer and the
    /// cell is flagged.
    pub fn change_value(&mut self, key: &CellKey, value: FieldValue) -> Option<bool> {
        let buffer = self.editing.get_mut(key)?;
        let valid = buffer.column.validate(&value);
        buffer.current = value;
        buffer.typed = true;
        if valid {
            self.invalid.remove(key);
        } else {
            self.invalid.insert(key.clone());
        }
        Some(valid)
    }

    /// Close a cell, keeping its value. Returns the final value.
    pub fn finish_edit(&mut self, key: &CellKey) -> Option<FieldValue> {
        self.editing.remove(key).map(|buffer| buffer.current)
    }

    /// Close a cell, discarding its buffer. Returns the pre-edit value.
    pub fn cancel_edit(&mut self, key: &CellKey) -> Option<FieldValue> {
        let buffer = self.editing.remove(key)?;
        self.invalid.remove(key);
        Some(buffer.original)
    }

    /// React to a key press in an open cell.
    pub fn handle_key(&mut self, key: &CellKey, press: EditKey, grid: GridSize) -> KeyOutcome {
        let Some(buffer) = self.editing.get(key) else {
            return KeyOutcome::Ignored;
        };
        let direction = match press {
            EditKey::Escape => {
                return match self.cancel_edit(key) {
                    Some(restore) => KeyOutcome::Reverted { restore },
                    None => KeyOutcome::Ignored,
                };
            }
            EditKey::Enter => Direction::Down,
            EditKey::ShiftEnter => Direction::Up,
            EditKey::Tab => Direction::Right,
            EditKey::ShiftTab => Direction::Left,
            EditKey::ArrowUp | EditKey::ArrowDown => {
                if buffer.typed && !buffer.column.kind.is_numeric() {
                    return KeyOutcome::Ignored;
                }
                if press == EditKey::ArrowUp {
                    Direction::Up
                } else {
                    Direction::Down
                }
            }
        };
        let from = buffer.position;
        self.finish_edit(key);
        KeyOutcome::Committed {
            next: self.navigate(from, direction, grid),
        }
    }

    /// Move focus one step, clamped at the grid edges.
    pub fn navigate(&mut self, from: CellPosition, direction: Direction, grid: GridSize) -> CellPosition {
        let last_row = grid.rows.saturating_sub(1);
        let last_column = grid.columns.saturating_sub(1);
        let next = match direction {
            Direction::Up => CellPosition::new(from.row.saturating_sub(1), from.column),
            Direction::Down => CellPosition::new((from.row + 1).min(last_row), from.column),
            Direction::Left => CellPosition::new(from.row, from.column.saturating_sub(1)),
            Direction::Right => CellPosition::new(from.row, (from.column + 1).min(last_column)),
        };
        self.focus = Some(next);
        next
    }

    pub fn is_editing(&self, key: &CellKey) -> bool {
        self.editing.contains_key(key)
    }

    /// Buffered value of an open cell.
    pub fn buffer(&self, key: &CellKey) -> Option<&FieldValue> {
        self.editing.get(key).map(|b| &b.current)
    }

    pub fn editing_cells(&self) -> impl Iterator<Item = &CellKey> {
        self.editing.keys()
    }

    pub fn is_invalid(&self, key: &CellKey) -> bool {
        self.invalid.contains(key)
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid.len()
    }

    pub fn focus(&self) -> Option<CellPosition> {
        self.focus
    }

    /// Close every cell and drop every flag.
    pub fn clear(&mut self) {
        self.editing.clear();
        self.invalid.clear();
        self.focus = None;
    }

    /// Close the cells of entities that no longer exist.
    pub fn forget<F>(&mut self, is_gone: F)
    where
        F: Fn(&EntityId) -> bool,
    {
        self.editing.retain(|key, _| !is_gone(&key.entity_id));
        self.invalid.retain(|key| !is_gone(&key.entity_id));
    }

    /// Drop the invalid flag of a cell whose value was replaced outside the editor.
    pub fn revalidate(&mut self, key: &CellKey, column: &Column, value: &FieldValue) {
        if column.validate(value) {
            self.invalid.remove(key);
        } else if column.kind != ColumnKind::Readonly {
            self.invalid.insert(key.clone());
        }
    }
}
