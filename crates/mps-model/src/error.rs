//! Model error types.

use thiserror::Error;

/// Errors raised by the plan data model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelError {
    /// An entity id was empty or whitespace.
    #[error("invalid entity id: '{0}'")]
    InvalidId(String),

    /// A required context identifier is missing.
    #[error("missing required context: {field}")]
    MissingContext {
        /// Name of the missing identifier (client, campaign, version, onglet).
        field: &'static str,
    },

    /// A field value could not be applied to an entity.
    #[error("invalid value for field '{field}': {message}")]
    InvalidField {
        /// Field key that failed.
        field: String,
        /// Description of the conversion failure.
        message: String,
    },

    /// The entity was not found in the plan.
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// A hierarchy path did not match the expected depth for its kind.
    #[error("malformed hierarchy path for {kind}: expected {expected} ancestors, found {found}")]
    MalformedPath {
        /// Entity kind label.
        kind: &'static str,
        /// Expected number of ancestors.
        expected: usize,
        /// Actual number of ancestors.
        found: usize,
    },
}

impl ModelError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingContext { field } => {
                format!("No {field} is selected. Pick one before continuing.")
            }
            Self::InvalidField { field, .. } => {
                format!("The value entered for '{field}' has the wrong type.")
            }
            other => other.to_string(),
        }
    }
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
