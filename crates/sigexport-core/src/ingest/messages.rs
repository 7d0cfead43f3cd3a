use tracing::{debug, info};

use crate::constants::EXCLUDED_MESSAGE_TYPES;
use crate::error::{ExportError, Result};
use crate::models::{Conversations, Message, MessagePayload};
use crate::store::MessageRow;

/// Per-run ingestion counters, one per exclusion rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub kept: usize,
    pub unknown_conversation: usize,
    pub system_type: usize,
    pub untyped: usize,
    pub disappearing: usize,
}

impl IngestStats {
    pub fn dropped(&self) -> usize {
        self.unknown_conversation + self.system_type + self.untyped + self.disappearing
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    Keep,
    UnknownConversation,
    SystemType,
    Untyped,
    Disappearing,
}

fn classify(row: &MessageRow, conversations: &Conversations, include_disappearing: bool) -> Verdict {
    match row.conversation_id.as_deref() {
        Some(cid) if conversations.contains_key(cid) => {}
        _ => return Verdict::UnknownConversation,
    }
    match row.kind.as_deref() {
        None => return Verdict::Untyped,
        Some(kind) if EXCLUDED_MESSAGE_TYPES.contains(&kind) => return Verdict::SystemType,
        Some(_) => {}
    }
    if row.is_disappearing() && !include_disappearing {
        return Verdict::Disappearing;
    }
    Verdict::Keep
}

fn decode_payload(row: &MessageRow) -> Result<MessagePayload> {
    let raw = row.payload.as_deref().ok_or_else(|| ExportError::MalformedRow {
        message_id: row.id.clone(),
        reason: "payload document is missing".to_string(),
    })?;
    MessagePayload::parse(raw).map_err(|e| ExportError::MalformedRow {
        message_id: row.id.clone(),
        reason: e.to_string(),
    })
}

fn build_message(row: MessageRow, conversation_id: String, mut payload: MessagePayload) -> Message {
    Message {
        conversation_id,
        id: row.id,
        kind: row.kind.unwrap_or_default(),
        body: row.body,
        source: row.source,
        timestamp: row.timestamp,
        sent_at: row.sent_at,
        server_timestamp: row.server_timestamp,
        has_attachments: row.has_attachments,
        attachments: payload.take_attachments(),
        read_status: row.read_status,
        seen_status: row.seen_status,
        call_history: payload.call_history.take(),
        reactions: payload.take_reactions(),
        sticker: payload.sticker.take(),
        quote: payload.quote.take(),
    }
}

/// Stream message rows (already in `sent_at` order) into their conversation
/// buckets.
///
/// Every row's payload is decoded before the inclusion rules run, so a
/// malformed payload aborts ingestion even when the row would be dropped.
pub fn ingest_messages<I>(
    rows: I,
    conversations: &mut Conversations,
    include_disappearing: bool,
) -> Result<IngestStats>
where
    I: IntoIterator<Item = Result<MessageRow>>,
{
    let mut stats = IngestStats::default();

    for row in rows {
        let row = row?;
        let payload = decode_payload(&row)?;

        match classify(&row, conversations, include_disappearing) {
            Verdict::Keep => {}
            Verdict::UnknownConversation => {
                stats.unknown_conversation += 1;
                continue;
            }
            Verdict::SystemType => {
                stats.system_type += 1;
                continue;
            }
            Verdict::Untyped => {
                debug!(message_id = %row.id, "dropping message without a type");
                stats.untyped += 1;
                continue;
            }
            Verdict::Disappearing => {
                stats.disappearing += 1;
                continue;
            }
        }

        // classify() guarantees a known conversation id
        let Some(cid) = row.conversation_id.clone() else {
            continue;
        };
        if let Some(bucket) = conversations.get_mut(&cid) {
            bucket.push(build_message(row, cid, payload));
            stats.kept += 1;
        }
    }

    info!(
        kept = stats.kept,
        dropped = stats.dropped(),
        "ingested messages"
    );
    debug!(
        unknown_conversation = stats.unknown_conversation,
        system_type = stats.system_type,
        untyped = stats.untyped,
        disappearing = stats.disappearing,
        "message drop breakdown"
    );
    Ok(stats)
}
