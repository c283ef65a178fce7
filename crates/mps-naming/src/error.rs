//! Naming error types.

use mps_store::StoreError;
use thiserror::Error;

/// Error raised while rendering a taxonomy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NamingError {
    /// Loading a shortcode failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A value points at a shortcode that does not exist.
    #[error("variable <{variable}> references unknown shortcode '{shortcode_id}'")]
    UnknownShortcode {
        variable: String,
        shortcode_id: String,
    },
}

impl NamingError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(inner) => inner.user_message(),
            Self::UnknownShortcode { variable, .. } => {
                format!("The value chosen for {variable} no longer exists.")
            }
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Store(_) => None,
            Self::UnknownShortcode { .. } => Some("Pick the value again from the list."),
        }
    }
}

/// Result type alias for naming operations.
pub type Result<T> = std::result::Result<T, NamingError>;
