use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_FILE, DB_RELATIVE_PATH, SIGNAL_DIR_NAME};
use crate::models::Contacts;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub source_dir: PathBuf,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(source_dir: P) -> Self {
        Self {
            source_dir: source_dir.as_ref().to_path_buf(),
        }
    }

    /// Platform default Signal Desktop directory, if the platform has a config dir
    pub fn default_source() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(SIGNAL_DIR_NAME))
    }

    pub fn db_path(&self) -> PathBuf {
        self.source_dir.join(DB_RELATIVE_PATH)
    }

    pub fn config_json_path(&self) -> PathBuf {
        self.source_dir.join(CONFIG_FILE)
    }
}

/// Allow-list of chat names. An empty filter retains every conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatFilter {
    names: HashSet<String>,
}

impl ChatFilter {
    /// Parse a comma-separated list. Matching is exact and case-sensitive.
    pub fn parse(raw: &str) -> Self {
        Self::from_names(raw.split(',').filter(|name| !name.is_empty()))
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Whether a conversation with these names is retained
    pub fn retains(&self, name: Option<&str>, profile_name: Option<&str>) -> bool {
        if self.is_unrestricted() {
            return true;
        }
        [name, profile_name]
            .into_iter()
            .flatten()
            .any(|candidate| self.contains(candidate))
    }

    /// Entries matching neither the name nor the profile name of any contact, sorted
    pub fn unmatched(&self, contacts: &Contacts) -> Vec<&str> {
        let mut missing: Vec<&str> = self
            .names
            .iter()
            .filter(|wanted| {
                !contacts.iter().any(|c| {
                    c.name.as_deref() == Some(wanted.as_str())
                        || c.profile_name.as_deref() == Some(wanted.as_str())
                })
            })
            .map(String::as_str)
            .collect();
        missing.sort_unstable();
        missing
    }

    /// Filter entries as a list, for restricting the metadata export
    pub fn names(&self) -> Option<Vec<String>> {
        if self.is_unrestricted() {
            return None;
        }
        let mut names: Vec<String> = self.names.iter().cloned().collect();
        names.sort();
        Some(names)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub chats: ChatFilter,
    pub include_empty: bool,
    pub include_disappearing: bool,
}

#[derive(Debug, Clone)]
pub struct MetadataOptions {
    /// Restrict the export to these group names (None = every group)
    pub groups: Option<Vec<String>>,
    pub exported_on: NaiveDateTime,
}

impl MetadataOptions {
    pub fn now(groups: Option<Vec<String>>) -> Self {
        Self {
            groups,
            exported_on: chrono::Local::now().naive_local(),
        }
    }
}
