//! Table engine configuration.

use serde::{Deserialize, Serialize};

/// What happens to the pending changes of entities whose update failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Failed entities keep their pending changes so a retry targets only them.
    #[default]
    KeepFailed,
    /// Every attempted entity is cleared, failed or not.
    DiscardAttempted,
}

/// Behaviour switches for [`TableEngine`](crate::TableEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Refuse to start a save while any edited cell fails validation.
    pub block_save_on_invalid: bool,

    /// Pending-change policy for failed entities.
    pub failure_policy: FailurePolicy,

    /// Reload canonical data after a save with failures.
    pub refresh_after_failure: bool,

    /// Clear the row selection after a fully successful save.
    pub clear_selection_on_save: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            block_save_on_invalid: false,
            failure_policy: FailurePolicy::KeepFailed,
            refresh_after_failure: true,
            clear_selection_on_save: true,
        }
    }
}
