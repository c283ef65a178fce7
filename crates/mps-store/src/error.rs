//! Store error types.
//!
//! Every store call returns a structured error that the table engine turns
//! into a banner message and a per-entity commit result.

use mps_model::ModelError;
use thiserror::Error;

/// Store operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// The data model rejected the call (missing context, bad field type, ...).
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The client / campaign / version / onglet scope does not exist.
    #[error("scope not found: {scope}")]
    ScopeNotFound {
        /// Human-readable description of the scope.
        scope: String,
    },

    /// The backend rejected or failed the request.
    #[error("failed to {operation} {target}: {message}")]
    Backend {
        /// Operation name (update, delete, add, read).
        operation: &'static str,
        /// Entity or collection the call was aimed at.
        target: String,
        /// Backend message.
        message: String,
    },
}

impl StoreError {
    /// Create a backend error.
    pub fn backend(
        operation: &'static str,
        target: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Backend {
            operation,
            target: target.into(),
            message: message.to_string(),
        }
    }

    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Model(inner) => inner.user_message(),
            Self::ScopeNotFound { scope } => {
                format!("The selected {scope} no longer exists. Refresh and pick another one.")
            }
            Self::Backend {
                operation, target, ..
            } => format!("Could not {operation} {target}. Your changes were kept."),
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
