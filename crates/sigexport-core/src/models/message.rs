use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Contact id -> retained messages, in `sent_at` order
pub type Conversations = BTreeMap<String, Vec<Message>>;

/// Attachment descriptor from the message payload.
///
/// Keys without a typed accessor (dimensions, CDN locators, digests) are kept
/// in `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default, deserialize_with = "lenient_string")]
    pub content_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub file_name: Option<String>,
    /// Path relative to the store's attachments directory
    #[serde(default, deserialize_with = "lenient_string")]
    pub path: Option<String>,
    /// Byte count; fractional values are truncated
    #[serde(default, deserialize_with = "lenient_u64")]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    #[serde(default, deserialize_with = "lenient_string")]
    pub emoji: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub from_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub target_timestamp: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub timestamp: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Descriptor fields come from several client generations. A value of an
// unexpected type reads as absent instead of failing the whole payload.

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// The `json` document stored alongside each message row.
///
/// Only the parts the export uses are decoded. List fields default to empty,
/// the rest to absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    attachments: Option<Vec<Attachment>>,
    #[serde(default)]
    reactions: Option<Vec<Reaction>>,
    #[serde(default)]
    pub call_history: Option<Value>,
    #[serde(default)]
    pub sticker: Option<Value>,
    #[serde(default)]
    pub quote: Option<Value>,
}

impl MessagePayload {
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn take_attachments(&mut self) -> Vec<Attachment> {
        self.attachments.take().unwrap_or_default()
    }

    pub fn take_reactions(&mut self) -> Vec<Reaction> {
        self.reactions.take().unwrap_or_default()
    }
}

/// A retained message. Owned by exactly one conversation bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub conversation_id: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub body: Option<String>,
    /// Sender service id
    pub source: Option<String>,
    // Three independent clocks; ordering uses `sent_at`
    pub timestamp: Option<i64>,
    pub sent_at: Option<i64>,
    pub server_timestamp: Option<i64>,
    pub has_attachments: bool,
    pub attachments: Vec<Attachment>,
    pub read_status: Option<i64>,
    pub seen_status: Option<i64>,
    pub call_history: Option<Value>,
    pub reactions: Vec<Reaction>,
    pub sticker: Option<Value>,
    pub quote: Option<Value>,
}
