use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Exporter defaults that can be loaded from a JSON file.
/// Command-line flags take precedence over every field.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Signal Desktop source directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,

    /// Raw hex key for the store, skipping config.json
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Passphrase handed to the key resolver
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Owner service id or contact name for metadata exports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl CliConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Fill unset fields from `other`
    pub fn or(self, other: CliConfig) -> Self {
        Self {
            source: self.source.or(other.source),
            key: self.key.or(other.key),
            password: self.password.or(other.password),
            owner: self.owner.or(other.owner),
        }
    }
}
