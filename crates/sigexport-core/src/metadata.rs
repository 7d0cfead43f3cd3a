//! Group membership metadata
//!
//! For each exported group, every member is listed with the other groups they
//! belong to. Groups the owner is part of are never listed: a member's row
//! must not reveal which other groups the exporting user shares with them.

use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::MetadataOptions;
use crate::error::{ExportError, Result};
use crate::models::{
    Contact, Contacts, GroupExport, GroupMetadata, MemberMetadata, EXPORTED_ON_FORMAT,
};

/// Names of the other groups `member_sid` belongs to, redacting every group
/// that contains the owner.
fn shared_groups(member_sid: &str, current: &Contact, groups: &[&Contact], owner_sid: &str) -> Vec<String> {
    if member_sid == owner_sid {
        return Vec::new();
    }
    groups
        .iter()
        .filter(|g| g.id != current.id)
        .filter(|g| g.has_member(member_sid))
        .filter(|g| !g.has_member(owner_sid))
        .map(|g| g.display_name().to_string())
        .collect()
}

fn resolve_members<'a>(
    group: &Contact,
    index: &HashMap<&str, &'a Contact>,
) -> Result<Vec<&'a Contact>> {
    group
        .members
        .iter()
        .map(|sid| {
            index
                .get(sid.as_str())
                .copied()
                .ok_or_else(|| ExportError::IncompleteIndex {
                    group: group.display_name().to_string(),
                    service_id: sid.clone(),
                })
        })
        .collect()
}

/// Check every requested group name exists before doing any work
fn check_requested(groups: &[&Contact], requested: &[String]) -> Result<()> {
    let missing: Vec<&str> = requested
        .iter()
        .filter(|name| !groups.iter().any(|g| g.name.as_deref() == Some(name.as_str())))
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ExportError::config(format!(
            "no group named {}",
            missing.join(", ")
        )))
    }
}

/// Build nested and flattened metadata for every qualifying group.
///
/// A group qualifies when `options.groups` is unset or names it. Members are
/// resolved by service id; a member without a contact fails the export.
pub fn export_group_metadata(
    contacts: &Contacts,
    owner: &Contact,
    options: &MetadataOptions,
) -> Result<Vec<GroupExport>> {
    let owner_sid = owner.service_id.as_deref().ok_or_else(|| {
        ExportError::config(format!(
            "owner '{}' has no service id to redact",
            owner.display_name()
        ))
    })?;

    let groups: Vec<&Contact> = contacts.groups().collect();
    if let Some(requested) = &options.groups {
        check_requested(&groups, requested)?;
    }

    let index = contacts.by_service_id();
    let exported_by = owner.profile_name.clone();
    let exported_on = options.exported_on.format(EXPORTED_ON_FORMAT).to_string();

    let mut exports = Vec::new();
    for group in groups.iter().copied() {
        if let Some(requested) = &options.groups {
            if !group.name.as_ref().is_some_and(|name| requested.contains(name)) {
                continue;
            }
        }

        let members = resolve_members(group, &index)?
            .into_iter()
            .map(|member| MemberMetadata {
                name: member.name.clone(),
                display_name: member.profile_name.clone(),
                number: member.number.clone(),
                other_groups: member
                    .service_id
                    .as_deref()
                    .map(|sid| shared_groups(sid, group, &groups, owner_sid))
                    .unwrap_or_default(),
            })
            .collect();

        let metadata = GroupMetadata {
            name: group.display_name().to_string(),
            exported_by: exported_by.clone(),
            exported_on: exported_on.clone(),
            members,
        };
        let rows = metadata.flatten()?;
        debug!(group = %metadata.name, members = rows.len(), "built group metadata");
        exports.push(GroupExport { metadata, rows });
    }

    info!(groups = exports.len(), "exported group metadata");
    Ok(exports)
}
