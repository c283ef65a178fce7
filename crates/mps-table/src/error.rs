//! Table engine error types.

use mps_model::{EntityId, ModelError};
use mps_store::StoreError;
use thiserror::Error;

/// Error raised by the table engine.
///
/// Per-entity save failures are not errors of the engine itself; they are
/// reported in a [`CommitReport`](crate::CommitReport).
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum TableError {
    /// Missing context, unknown entity or bad field value.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The store call itself failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A save batch is already in flight.
    #[error("a save is already in progress (batch {generation})")]
    SaveInProgress {
        /// Generation of the batch in flight.
        generation: u64,
    },

    /// Saving is blocked because some edited cells fail validation.
    #[error("{count} edited cell(s) are invalid")]
    InvalidCells {
        /// Number of invalid cells.
        count: usize,
    },

    /// A commit report does not belong to the batch in flight.
    #[error("commit report for batch {received} does not match the save in flight ({expected:?})")]
    StaleBatch {
        /// Generation of the batch in flight, if any.
        expected: Option<u64>,
        /// Generation carried by the report.
        received: u64,
    },

    /// Ids, parent keys, order fields and timestamps are owned by the
    /// hierarchy and cannot be edited as cells.
    #[error("field {field} of {entity_id} is structural and cannot be edited")]
    StructuralField {
        entity_id: EntityId,
        field: String,
    },

    /// The cell is not in edit mode.
    #[error("cell {entity_id}/{field} is not being edited")]
    NotEditing {
        entity_id: EntityId,
        field: String,
    },
}

impl TableError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Model(inner) => inner.user_message(),
            Self::Store(inner) => inner.user_message(),
            Self::SaveInProgress { .. } => "A save is already running.".to_string(),
            Self::InvalidCells { count } => {
                format!("{count} cell(s) contain invalid values and must be fixed before saving.")
            }
            Self::StaleBatch { .. } => "The save result arrived too late and was ignored.".to_string(),
            Self::StructuralField { field, .. } => {
                format!("{field} is managed by the plan hierarchy and cannot be edited.")
            }
            Self::NotEditing { field, .. } => format!("The {field} cell is not being edited."),
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::SaveInProgress { .. } => Some("Wait for the current save to finish."),
            Self::InvalidCells { .. } => Some("Correct the highlighted cells, then save again."),
            Self::Store(_) => Some("Refresh the table and try again."),
            Self::StructuralField { .. } => {
                Some("Use the move command to change where an element sits.")
            }
            _ => None,
        }
    }

    /// Whether the same action may succeed if retried later.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Store(inner) => inner.is_recoverable(),
            Self::SaveInProgress { .. } | Self::InvalidCells { .. } => true,
            _ => false,
        }
    }
}

/// Result type alias for table operations.
pub type Result<T> = std::result::Result<T, TableError>;
