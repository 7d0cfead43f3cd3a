use rusqlite::Row;

pub(crate) const CONVERSATIONS_QUERY: &str =
    "SELECT type, id, serviceId, e164, name, profileName, members FROM conversations";

pub(crate) const MESSAGES_QUERY: &str = "SELECT conversationId, type, json, id, body, sourceServiceId, timestamp, sent_at, serverTimestamp, hasAttachments, readStatus, seenStatus, expireTimer FROM messages ORDER BY sent_at";

pub(crate) const OWNER_QUERY: &str = "SELECT json FROM items WHERE id = ?1";

pub(crate) const ITEMS_TABLE: &str = "items";

pub(crate) const TABLE_EXISTS_QUERY: &str =
    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)";

/// Raw `conversations` row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationRow {
    pub kind: Option<String>,
    pub id: String,
    pub service_id: Option<String>,
    pub number: Option<String>,
    pub name: Option<String>,
    pub profile_name: Option<String>,
    /// Space-separated member service ids
    pub members: Option<String>,
}

impl ConversationRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            kind: row.get(0)?,
            id: row.get(1)?,
            service_id: row.get(2)?,
            number: row.get(3)?,
            name: row.get(4)?,
            profile_name: row.get(5)?,
            members: row.get(6)?,
        })
    }
}

/// Raw `messages` row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageRow {
    pub conversation_id: Option<String>,
    pub kind: Option<String>,
    /// The serialized `json` payload document
    pub payload: Option<String>,
    pub id: String,
    pub body: Option<String>,
    pub source: Option<String>,
    pub timestamp: Option<i64>,
    pub sent_at: Option<i64>,
    pub server_timestamp: Option<i64>,
    pub has_attachments: bool,
    pub read_status: Option<i64>,
    pub seen_status: Option<i64>,
    pub expire_timer: Option<i64>,
}

impl MessageRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let has_attachments: Option<i64> = row.get(9)?;
        Ok(Self {
            conversation_id: row.get(0)?,
            kind: row.get(1)?,
            payload: row.get(2)?,
            id: row.get(3)?,
            body: row.get(4)?,
            source: row.get(5)?,
            timestamp: row.get(6)?,
            sent_at: row.get(7)?,
            server_timestamp: row.get(8)?,
            has_attachments: has_attachments.unwrap_or(0) != 0,
            read_status: row.get(10)?,
            seen_status: row.get(11)?,
            expire_timer: row.get(12)?,
        })
    }

    /// Disappearing messages carry a non-zero expiration timer
    pub fn is_disappearing(&self) -> bool {
        self.expire_timer.unwrap_or(0) != 0
    }
}
