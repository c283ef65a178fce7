use std::borrow::Borrow;
use std::fmt;

use crate::ModelError;

/// Identifier of any plan entity (section, tactique, placement, créatif).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_rejects_blank() {
        assert_eq!(EntityId::new("  S1 ").unwrap().as_str(), "S1");
        assert!(matches!(
            EntityId::new("   "),
            Err(ModelError::InvalidId(_))
        ));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = EntityId::new("T7").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"T7\"");
    }
}
