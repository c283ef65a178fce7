//! Plan context - the identifiers that scope every store call.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Client / campaign / version / onglet identifiers for one editing session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanContext {
    pub client_id: String,
    pub campaign_id: String,
    pub version_id: String,
    pub onglet_id: String,
}

impl PlanContext {
    pub fn new(
        client_id: impl Into<String>,
        campaign_id: impl Into<String>,
        version_id: impl Into<String>,
        onglet_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            campaign_id: campaign_id.into(),
            version_id: version_id.into(),
            onglet_id: onglet_id.into(),
        }
    }

    /// Check that every identifier is present.
    ///
    /// Called before any I/O so that a half-selected context fails fast.
    pub fn require(&self) -> Result<&Self> {
        let checks = [
            ("client", &self.client_id),
            ("campaign", &self.campaign_id),
            ("version", &self.version_id),
            ("onglet", &self.onglet_id),
        ];
        for (field, value) in checks {
            if value.trim().is_empty() {
                return Err(ModelError::MissingContext { field });
            }
        }
        Ok(self)
    }
}
