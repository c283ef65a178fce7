//! Plain records returned by the store besides plan entities.

use serde::{Deserialize, Serialize};

/// An id / name pair, used for campaigns, versions and onglets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedItem {
    pub id: String,
    pub name: String,
}

impl NamedItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A taxonomy shortcode: a reusable value with a short code and a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcode {
    pub id: String,
    /// Short code written into generated taxonomies (e.g. "GOOG").
    pub code: String,
    /// Human-readable name (e.g. "Google").
    pub display_name: String,
}
