//! Move error types.
//!
//! Selection problems are not errors: they are reported in
//! [`SelectionAnalysis::error_message`](crate::SelectionAnalysis). These
//! variants cover the picker and the move itself.

use mps_model::{EntityId, ModelError};
use mps_store::StoreError;
use thiserror::Error;

use crate::level::CascadeLevel;

/// Error raised while picking a destination or executing a move.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MoveError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The analysed selection cannot be moved.
    #[error("selection cannot be moved: {message}")]
    InvalidSelection { message: String },

    /// A destination level required by the move has no selection.
    #[error("no {level} selected for the destination")]
    IncompleteDestination { level: CascadeLevel },

    /// The destination parent does not exist in the destination onglet.
    #[error("destination {id} not found")]
    DestinationNotFound { id: String },

    /// The picked item is not among the loaded items of its level.
    #[error("{id} is not a known {level}")]
    UnknownItem { level: CascadeLevel, id: String },

    /// A root was copied but its original could not be removed.
    #[error("{id} was copied but the original could not be deleted: {message}")]
    SourceNotDeleted { id: EntityId, message: String },
}

impl MoveError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Model(inner) => inner.user_message(),
            Self::Store(inner) => inner.user_message(),
            Self::InvalidSelection { message } => message.clone(),
            Self::IncompleteDestination { level } => {
                format!("Choose a destination {level} before moving.")
            }
            Self::SourceNotDeleted { id, .. } => {
                format!("{id} now exists twice: the copy was created but the original remains.")
            }
            other => other.to_string(),
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::IncompleteDestination { .. } => Some("Complete every level of the destination."),
            Self::DestinationNotFound { .. } | Self::UnknownItem { .. } => {
                Some("Reload the destination lists and pick again.")
            }
            Self::SourceNotDeleted { .. } => Some("Delete the original element manually."),
            _ => None,
        }
    }
}

/// Result type alias for move operations.
pub type Result<T> = std::result::Result<T, MoveError>;
