//! Flat input records and their normalization.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Label used when a record carries no label.
pub const UNTITLED_NODE: &str = "Untitled Node";

/// One flat record as delivered by a data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default, deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl RawRecord {
    /// Minimal record with an id, optional parent and label.
    pub fn new(id: impl Into<String>, parent_id: Option<&str>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.map(str::to_string),
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// Record with every text field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub id: String,
    pub parent_id: Option<String>,
    pub label: String,
    pub url: String,
    pub description: String,
    pub image_url: String,
}

impl From<&RawRecord> for NormalizedRecord {
    fn from(raw: &RawRecord) -> Self {
        Self {
            id: raw.id.clone(),
            parent_id: raw.parent_id.clone(),
            label: non_empty_or(raw.label.as_deref(), UNTITLED_NODE),
            url: non_empty_or(raw.url.as_deref(), ""),
            description: non_empty_or(raw.description.as_deref(), ""),
            image_url: non_empty_or(raw.image_url.as_deref(), ""),
        }
    }
}

fn non_empty_or(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

/// Apply field defaults to every record. Never drops a record.
pub fn normalize(records: &[RawRecord]) -> Vec<NormalizedRecord> {
    records.iter().map(NormalizedRecord::from).collect()
}

/// Drop records without an id; they cannot take part in the hierarchy.
pub fn retain_identified(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let before = records.len();
    let kept: Vec<RawRecord> = records
        .into_iter()
        .filter(|r| !r.id.trim().is_empty())
        .collect();
    if kept.len() < before {
        warn!("dropped {} record(s) without id", before - kept.len());
    }
    kept
}

/// Accepted shapes of a record document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RecordPayload {
    Records(Vec<RawRecord>),
    Envelope {
        #[serde(default)]
        nodes: Vec<RawRecord>,
        #[serde(default)]
        timestamp: Option<String>,
    },
}

impl RecordPayload {
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Split into records and the optional sync timestamp.
    pub fn into_parts(self) -> (Vec<RawRecord>, Option<String>) {
        match self {
            RecordPayload::Records(records) => (records, None),
            RecordPayload::Envelope { nodes, timestamp } => (nodes, timestamp),
        }
    }
}

// Spreadsheet exports and hand-edited documents sometimes carry numeric ids.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Int(i64),
    Float(f64),
}

impl IdRepr {
    fn into_string(self) -> String {
        match self {
            IdRepr::Text(s) => s,
            IdRepr::Int(i) => i.to_string(),
            IdRepr::Float(f) if f.fract() == 0.0 => format!("{}", f as i64),
            IdRepr::Float(f) => f.to_string(),
        }
    }
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<IdRepr>::deserialize(deserializer)?;
    Ok(repr.map(IdRepr::into_string))
}

fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_opt_id(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_missing_label_when_normalizing_then_defaults_to_untitled() {
        let raw = RawRecord {
            id: "7".into(),
            ..RawRecord::default()
        };
        let normalized = NormalizedRecord::from(&raw);
        assert_eq!(normalized.label, UNTITLED_NODE);
        assert_eq!(normalized.url, "");
        assert_eq!(normalized.description, "");
        assert_eq!(normalized.image_url, "");
    }

    #[test]
    fn given_numeric_ids_when_parsing_then_converts_to_strings() {
        let payload = RecordPayload::parse(
            r#"[{"id": 1, "parentId": null, "label": "A"}, {"id": 2, "parentId": 1, "label": "B"}]"#,
        )
        .unwrap();
        let (records, timestamp) = payload.into_parts();
        assert!(timestamp.is_none());
        assert_eq!(records[0].id, "1");
        assert_eq!(records[1].parent_id.as_deref(), Some("1"));
    }

    #[test]
    fn given_envelope_when_parsing_then_keeps_timestamp() {
        let payload = RecordPayload::parse(
            r#"{"timestamp": "2025-01-01T10:00:00.000Z", "nodes": [{"id": "1", "parentId": null, "label": "A"}]}"#,
        )
        .unwrap();
        let (records, timestamp) = payload.into_parts();
        assert_eq!(records.len(), 1);
        assert_eq!(timestamp.as_deref(), Some("2025-01-01T10:00:00.000Z"));
    }

    #[test]
    fn given_records_without_id_when_retaining_then_drops_them() {
        let records = vec![
            RawRecord::new("1", None, "A"),
            RawRecord::new("", None, "ghost"),
            RawRecord::new("  ", Some("1"), "blank"),
        ];
        let kept = retain_identified(records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "1");
    }
}
