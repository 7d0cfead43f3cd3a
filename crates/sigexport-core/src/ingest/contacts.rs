use tracing::debug;

use crate::config::ChatFilter;
use crate::constants::GROUP_KIND;
use crate::error::Result;
use crate::models::{Contact, Contacts, Conversations};
use crate::store::ConversationRow;

impl From<ConversationRow> for Contact {
    fn from(row: ConversationRow) -> Self {
        let is_group = row.kind.as_deref() == Some(GROUP_KIND);
        let members = row
            .members
            .as_deref()
            .map(|m| m.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        // One-time fallback: an unset or empty name takes the profile name
        let name = match row.name {
            Some(name) if !name.is_empty() => Some(name),
            _ => row.profile_name.clone(),
        };

        Contact {
            id: row.id,
            service_id: row.service_id,
            number: row.number,
            name,
            profile_name: row.profile_name,
            members,
            is_group,
        }
    }
}

/// Normalize conversation rows into contacts, and open an empty bucket for
/// every conversation the chat filter retains.
pub fn normalize_contacts<I>(rows: I, chats: &ChatFilter) -> Result<(Contacts, Conversations)>
where
    I: IntoIterator<Item = Result<ConversationRow>>,
{
    let mut contacts = Contacts::new();
    let mut conversations = Conversations::new();

    for row in rows {
        let row = row?;
        debug!(
            name = row.name.as_deref().unwrap_or(""),
            profile_name = row.profile_name.as_deref().unwrap_or(""),
            "loading conversation"
        );

        let retained = chats.retains(row.name.as_deref(), row.profile_name.as_deref());
        let contact = Contact::from(row);
        if retained {
            conversations.insert(contact.id.clone(), Vec::new());
        }
        contacts.insert(contact);
    }

    Ok((contacts, conversations))
}
