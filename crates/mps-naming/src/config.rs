//! Naming configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the shortcode cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// How long a loaded shortcode stays valid, in seconds.
    ///
    /// Zero disables caching: every lookup goes to the store.
    pub cache_ttl_secs: u64,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300, // 5 minutes
        }
    }
}

impl NamingConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: NamingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, NamingConfig::default());
        assert_eq!(config.ttl(), Duration::from_secs(300));
    }
}
