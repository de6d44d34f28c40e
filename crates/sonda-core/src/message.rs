use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Transport-assigned, strictly increasing per-queue position.
pub type SequenceNumber = u64;

/// Current wall-clock time in Unix-epoch milliseconds.
pub(crate) fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Scalar value of a custom message property.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(v) => write!(f, "{v}"),
            PropertyValue::Int(v) => write!(f, "{v}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::String(v) => f.write_str(v),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

/// Read-only snapshot of one queue entry, as returned by a peek.
///
/// Timestamps are unix-epoch milliseconds. Peeking never changes any of
/// these fields on the stored entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeekedMessage {
    pub sequence_number: SequenceNumber,
    pub message_id: String,
    pub correlation_id: Option<String>,
    pub session_id: Option<String>,
    pub content_type: Option<String>,
    pub subject: Option<String>,
    pub properties: BTreeMap<String, PropertyValue>,
    pub enqueued_at: u64,
    pub locked_until: Option<u64>,
    pub expires_at: Option<u64>,
    pub scheduled_enqueue_at: Option<u64>,
    pub delivery_count: u32,
    pub dead_letter_reason: Option<String>,
    pub dead_letter_description: Option<String>,
    pub body: Vec<u8>,
}

impl PeekedMessage {
    /// Body as text. Invalid UTF-8 sequences are replaced rather than rejected.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// A new message to publish. Sequence number, enqueue time and delivery
/// state are assigned by the transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutboundMessage {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub correlation_id: Option<String>,
    /// Generated by the transport when unset.
    pub message_id: Option<String>,
    pub subject: Option<String>,
    pub session_id: Option<String>,
    pub properties: BTreeMap<String, PropertyValue>,
    pub time_to_live_ms: Option<u64>,
}

impl OutboundMessage {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}
