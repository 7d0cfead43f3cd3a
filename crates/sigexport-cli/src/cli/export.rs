use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use sigexport_core::models::FlatMemberRow;
use sigexport_core::{Archive, Contact, Contacts, ExportError, GroupExport};
use tracing::info;

const META_FILE: &str = "meta.json";
const MEMBERS_FILE: &str = "members.csv";
const DATA_FILE: &str = "data.json";

/// Contact names for `list-chats`
pub fn list_chats(contacts: &Contacts) -> String {
    contacts.sorted_names().join(" | ")
}

/// Directory name for a chat; path separators would escape DEST
fn chat_dir_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "None".to_string(),
        _ => cleaned,
    }
}

/// Pick the owner: an explicit service id or name first, then the store's account
pub fn resolve_owner<'a>(archive: &'a Archive, requested: Option<&str>) -> Result<&'a Contact> {
    let owner = match requested {
        Some(wanted) => archive
            .contacts
            .find_by_service_id(wanted)
            .or_else(|| archive.contacts.find_person_by_name(wanted)),
        None => archive.owner(),
    };
    match owner {
        Some(owner) => Ok(owner),
        None => Err(ExportError::Configuration {
            message: match requested {
                Some(wanted) => format!("no contact matches owner '{}'", wanted),
                None => "the store does not record its owner; pass --owner".to_string(),
            },
        }
        .into()),
    }
}

/// Render member rows as CSV with a header line
pub fn members_csv(rows: &[FlatMemberRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(FlatMemberRow::COLUMNS)?;
    for row in rows {
        let other_groups = serde_json::to_string(&row.other_groups)?;
        let record: [&str; 8] = [
            row.group_name.as_str(),
            row.exported_by.as_deref().unwrap_or(""),
            row.exported_on.as_str(),
            &row.num_shared_groups.to_string(),
            row.name.as_deref().unwrap_or(""),
            row.display_name.as_deref().unwrap_or(""),
            row.number.as_deref().unwrap_or(""),
            &other_groups,
        ];
        writer.write_record(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Write `meta.json` and `members.csv` for every exported group
pub fn write_group_metadata(dest: &Path, exports: &[GroupExport]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for export in exports {
        let dir = dest.join(chat_dir_name(&export.metadata.name));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let meta_path = dir.join(META_FILE);
        let json = serde_json::to_string_pretty(&export.metadata)?;
        fs::write(&meta_path, json)
            .with_context(|| format!("Failed to write {}", meta_path.display()))?;

        let csv_path = dir.join(MEMBERS_FILE);
        fs::write(&csv_path, members_csv(&export.rows)?)
            .with_context(|| format!("Failed to write {}", csv_path.display()))?;

        info!(group = %export.metadata.name, members = export.rows.len(), "wrote group metadata");
        written.push(dir);
    }
    Ok(written)
}

/// Prepare DEST for a full dump. An existing DEST is only replaced with `overwrite`.
pub fn prepare_dest(dest: &Path, overwrite: bool) -> Result<()> {
    if dest.is_dir() {
        if !overwrite {
            bail!(
                "Output folder '{}' already exists, pass --overwrite to replace it",
                dest.display()
            );
        }
        fs::remove_dir_all(dest)
            .with_context(|| format!("Failed to clear {}", dest.display()))?;
    }
    fs::create_dir_all(dest).with_context(|| format!("Failed to create {}", dest.display()))
}

/// Write every retained conversation as JSON lines under `<dest>/<chat>/data.json`
pub fn dump_conversations(dest: &Path, archive: &Archive) -> Result<usize> {
    let mut count = 0;
    for (cid, messages) in &archive.conversations {
        let name = archive
            .contacts
            .get(cid)
            .and_then(|c| c.name.as_deref())
            .unwrap_or("None");
        let dir = dest.join(chat_dir_name(name));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = dir.join(DATA_FILE);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        for message in messages {
            serde_json::to_writer(&mut file, message)?;
            writeln!(file)?;
        }
        count += 1;
    }
    Ok(count)
}
