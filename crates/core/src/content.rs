//! The loosely-typed `content` field of an intake event.
//!
//! Upstream senders put either a single string or a list of strings here, or
//! leave it out entirely. The shape is resolved once, at deserialization, so
//! nothing downstream has to inspect raw JSON.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Lines(Vec<String>),
    #[default]
    Absent,
}

impl Content {
    /// Flatten to a single text blob. Lines are joined with `\n` in order;
    /// absent content is the empty string.
    pub fn normalize(&self) -> String {
        match self {
            Content::Text(s) => s.clone(),
            Content::Lines(lines) => lines.join("\n"),
            Content::Absent => String::new(),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Content::Absent)
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Content::Text(s),
            Value::Array(items) => {
                let mut lines = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => lines.push(s),
                        _ => return Content::Absent,
                    }
                }
                Content::Lines(lines)
            }
            _ => Content::Absent,
        }
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Any well-formed JSON value is accepted; unsupported shapes degrade to Absent.
        Ok(Value::deserialize(deserializer)?.into())
    }
}

impl Serialize for Content {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Content::Text(s) => serializer.serialize_str(s),
            Content::Lines(lines) => lines.serialize(serializer),
            Content::Absent => serializer.serialize_none(),
        }
    }
}
