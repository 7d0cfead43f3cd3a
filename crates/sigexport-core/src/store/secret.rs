//! Store secret handling
//!
//! The secret is a hex-encoded SQLCipher raw key. It never appears in
//! `Debug` output or error messages.
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::CONFIG_FILE;
use crate::error::{ExportError, Result};

#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Validate a raw hex key.
    pub fn from_hex(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExportError::SecretResolution {
                message: "key is empty".to_string(),
            });
        }
        // The decode error names offending characters, so it is not forwarded
        hex::decode(trimmed).map_err(|_| ExportError::SecretResolution {
            message: "key is not valid hex".to_string(),
        })?;
        Ok(Self(trimmed.to_string()))
    }

    /// SQLCipher raw-key literal, `x'<hex>'`
    pub(crate) fn key_literal(&self) -> String {
        format!("\"x'{}'\"", self.0)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Derives the store secret from a Signal source directory.
pub trait KeyResolver {
    fn resolve(&self, source_dir: &Path, password: Option<&str>) -> anyhow::Result<Secret>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignalConfig {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    encrypted_key: Option<String>,
}

/// Reads the plaintext `key` field of `config.json`.
///
/// Installs that moved to `encryptedKey` need platform key unwrapping, which
/// is not done here; the caller has to pass the key explicitly.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigFileKeyResolver;

impl KeyResolver for ConfigFileKeyResolver {
    fn resolve(&self, source_dir: &Path, _password: Option<&str>) -> anyhow::Result<Secret> {
        let path = source_dir.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: SignalConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        match (config.key, config.encrypted_key) {
            (Some(key), _) => Ok(Secret::from_hex(key)?),
            (None, Some(_)) => Err(anyhow!(
                "{} only holds an encrypted key; pass the decrypted key with --key",
                path.display()
            )),
            (None, None) => Err(anyhow!("No key found in {}", path.display())),
        }
    }
}

/// Where the session gets its secret from
pub enum SecretSource<'a> {
    Raw(String),
    Delegate {
        resolver: &'a dyn KeyResolver,
        source_dir: PathBuf,
        password: Option<String>,
    },
}

impl SecretSource<'_> {
    pub fn resolve(self) -> Result<Secret> {
        match self {
            SecretSource::Raw(raw) => Secret::from_hex(raw),
            SecretSource::Delegate {
                resolver,
                source_dir,
                password,
            } => resolver
                .resolve(&source_dir, password.as_deref())
                .map_err(|e| ExportError::SecretResolution {
                    message: format!("{:#}", e),
                }),
        }
    }
}
