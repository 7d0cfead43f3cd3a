use crate::models::Conversations;

/// Drop conversations without messages unless `include_empty` is set.
pub fn prune_conversations(mut conversations: Conversations, include_empty: bool) -> Conversations {
    if !include_empty {
        conversations.retain(|_, messages| !messages.is_empty());
    }
    conversations
}
