//! Application configuration.
//!
//! Settings live in a TOML file with one table per concern:
//!
//! ```toml
//! [table]
//! block_save_on_invalid = true
//! failure_policy = "keep_failed"
//!
//! [naming]
//! cache_ttl_secs = 300
//!
//! [logging]
//! format = "compact"
//! ```
//!
//! The file is taken from `--config`, else from the platform config
//! directory (e.g. `~/.config/mediaplan/config.toml` on Linux). Missing
//! sections and keys fall back to their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use mps_naming::NamingConfig;
use mps_table::TableConfig;
use serde::{Deserialize, Serialize};

use crate::logging::LogFormat;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "mediaplan";
const APP_NAME: &str = "mediaplan";
const CONFIG_FILENAME: &str = "config.toml";

/// Everything the binary can be configured with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub table: TableConfig,
    pub naming: NamingConfig,
    pub logging: LoggingSettings,
}

/// `[logging]` section. Command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: Option<LogFormat>,
    pub file: Option<PathBuf>,
    pub timestamps: bool,
}

/// Path of the per-user config file, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

impl AppConfig {
    /// Load the configuration.
    ///
    /// An explicit path must exist and parse. The per-user file is optional
    /// and a broken one is ignored with a warning.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        let Some(path) = default_config_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        match Self::load_from(&path) {
            Ok(config) => Ok(config),
            Err(error) => {
                eprintln!("warning: ignoring {}: {error:#}", path.display());
                Ok(Self::default())
            }
        }
    }

    /// Read and parse one TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mps_table::FailurePolicy;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            "[table]\nfailure_policy = \"discard_attempted\"\n\n[logging]\nformat = \"json\"\n",
        )
        .unwrap();
        assert_eq!(config.table.failure_policy, FailurePolicy::DiscardAttempted);
        assert!(config.table.refresh_after_failure);
        assert_eq!(config.naming, NamingConfig::default());
        assert_eq!(config.logging.format, Some(LogFormat::Json));
    }

    #[test]
    fn empty_file_is_the_default() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn default_round_trips_through_toml() {
        let text = toml::to_string_pretty(&AppConfig::default()).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }
}
