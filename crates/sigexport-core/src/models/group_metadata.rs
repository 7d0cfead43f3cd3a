use serde::Serialize;

use crate::error::{ExportError, Result};

/// Timestamp format written to `exported_on` (ISO-8601, local, microseconds)
pub const EXPORTED_ON_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Nested per-group metadata document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMetadata {
    pub name: String,
    pub exported_by: Option<String>,
    pub exported_on: String,
    pub members: Vec<MemberMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberMetadata {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub number: Option<String>,
    /// Other groups this member belongs to, owner-shared groups redacted
    pub other_groups: Vec<String>,
}

/// One member row of the flattened table, group fields repeated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatMemberRow {
    pub group_name: String,
    pub exported_by: Option<String>,
    pub exported_on: String,
    pub num_shared_groups: usize,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub number: Option<String>,
    pub other_groups: Vec<String>,
}

impl FlatMemberRow {
    pub const COLUMNS: [&'static str; 8] = [
        "group_name",
        "exported_by",
        "exported_on",
        "num_shared_groups",
        "name",
        "display_name",
        "number",
        "other_groups",
    ];
}

impl GroupMetadata {
    /// Flatten to one row per member.
    ///
    /// A group without members has no row shape, so it is rejected.
    pub fn flatten(&self) -> Result<Vec<FlatMemberRow>> {
        if self.members.is_empty() {
            return Err(ExportError::config(format!(
                "group '{}' has no resolvable members to export",
                self.name
            )));
        }

        Ok(self
            .members
            .iter()
            .map(|member| FlatMemberRow {
                group_name: self.name.clone(),
                exported_by: self.exported_by.clone(),
                exported_on: self.exported_on.clone(),
                num_shared_groups: member.other_groups.len(),
                name: member.name.clone(),
                display_name: member.display_name.clone(),
                number: member.number.clone(),
                other_groups: member.other_groups.clone(),
            })
            .collect())
    }
}

/// Both representations of one group, ready for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupExport {
    pub metadata: GroupMetadata,
    pub rows: Vec<FlatMemberRow>,
}
