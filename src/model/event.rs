use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single entry in a channel's event stream. `event_id` is expected to be
/// a time-sortable lexicographic identifier (a UUIDv7 string); partitions
/// are kept sorted by byte comparison of this field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub channel_type: String,
    pub channel_id: String,
    pub data: Value,
    pub timestamp: i64,
    /// Marks the terminal event of a stream; late subscribers that missed
    /// the live broadcast are replayed this one event so they learn the
    /// stream ended.
    #[serde(default)]
    pub end: bool,
}

impl Event {
    /// The partition a channel's events live in: the concatenation of its
    /// channel type and channel ID.
    pub fn partition_name(channel_type: &str, channel_id: &str) -> String {
        format!("{channel_type}_{channel_id}")
    }
}
