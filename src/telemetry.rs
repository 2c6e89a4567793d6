use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use sqlx::types::Json as SqlJson;
use sqlx::FromRow;

/// One vibration sample as stored by the ingest path. `sensor_readings` is a
/// jsonb array of per-channel entries, though some legacy rows hold the array
/// double-encoded as a json string.
#[derive(Debug, Clone, FromRow)]
pub struct ReadingRow {
    pub sensor_readings: SqlJson<JsonValue>,
    pub time: DateTime<Utc>,
}

/// How a device's configured channel is matched against payload entries.
/// Older registry entries name the channel by type, newer ones by numeric id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChannelSelector {
    Id(i64),
    Name(String),
}

impl ChannelSelector {
    fn matches(&self, entry: &Map<String, JsonValue>) -> bool {
        match self {
            ChannelSelector::Id(id) => {
                entry.get("sensor_id").and_then(JsonValue::as_i64) == Some(*id)
            }
            ChannelSelector::Name(name) => {
                entry.get("sensor_type").and_then(JsonValue::as_str) == Some(name.as_str())
            }
        }
    }
}

/// Pulls the selected channel's numeric value out of a payload. Only the
/// first matching entry is consulted. Malformed payloads, missing channels
/// and unconvertible values all come back as `None`.
pub fn extract_channel_value(payload: &JsonValue, channel: &ChannelSelector) -> Option<f64> {
    let decoded;
    let entries = match payload {
        JsonValue::String(raw) => {
            decoded = serde_json::from_str::<JsonValue>(raw).ok()?;
            decoded.as_array()?
        }
        other => other.as_array()?,
    };

    for entry in entries {
        let fields = entry.as_object()?;
        if channel.matches(fields) {
            return coerce_numeric(fields.get("value")?);
        }
    }
    None
}

fn coerce_numeric(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(num) => num.as_f64(),
        JsonValue::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
