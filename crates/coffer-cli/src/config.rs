//! CLI configuration management.
//!
//! `coffer.toml` in the data directory holds the governance deployment
//! settings and logging preferences.

use anyhow::Context;
use coffer_governance::GovernanceConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name inside the data directory.
pub const CONFIG_FILE: &str = "coffer.toml";

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `coffer_governance=debug`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Append logs to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
            file: None,
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    pub governance: GovernanceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CliConfig {
    /// Load configuration from `path`, `None` if the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: CliConfig = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.governance.validate()?;
        Ok(Some(config))
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Default data directory (`~/.coffer`).
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".coffer")
    }
}
