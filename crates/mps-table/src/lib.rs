//! Spreadsheet-style editing of a media plan hierarchy.
//!
//! The engine presents the Section → Tactique → Placement → Créatif tree of
//! one onglet as a flat table and buffers every edit locally until an
//! explicit save.
//!
//! # Architecture
//!
//! ```text
//! PlanData ──► projector ──► TableRow[] ──► host UI
//!                 ▲                            │
//!   pending ──────┤                            ▼
//!   overlay ──────┘              cell controller / bulk ops
//!                                              │
//!                                              ▼
//!                                   pending-change store ──► commit ──► PlanStore
//! ```
//!
//! # Modules
//!
//! - [`columns`]: column kinds, validation, formatting and the per-level catalog
//! - [`projector`]: flattening and value resolution (pending → overlay → canonical)
//! - [`pending`]: uncommitted edits with no-net-change pruning
//! - [`overlay`]: committed values waiting for the next canonical reload
//! - [`cell`]: edit mode, validation flags, keyboard navigation
//! - [`bulk`]: bulk edit, fill-down and copy-row
//! - [`commit`]: per-entity concurrent dispatch and reporting
//! - [`engine`]: the [`TableEngine`] facade

pub mod bulk;
pub mod cell;
pub mod columns;
pub mod commit;
pub mod config;
pub mod engine;
pub mod error;
pub mod overlay;
pub mod pending;
pub mod projector;
pub mod row;

pub use bulk::{BulkEdit, COPY_DENYLIST, copy_values, fill_down, is_copy_excluded};
pub use cell::{
    CellEditController, CellKey, CellPosition, Direction, EditKey, GridSize, KeyOutcome,
};
pub use columns::{Column, ColumnCatalog, ColumnKind, DefaultColumns, SelectOption};
pub use commit::{BatchEntry, CommitReport, EntityCommitResult, SaveBatch, dispatch_batch};
pub use config::{FailurePolicy, TableConfig};
pub use engine::TableEngine;
pub use error::{Result, TableError};
pub use overlay::SavedOverlay;
pub use pending::PendingChangeStore;
pub use projector::{effective_fields, effective_value, project_rows};
pub use row::TableRow;
