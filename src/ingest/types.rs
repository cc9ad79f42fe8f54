// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::extract::ExtractedSignal;

/// One normalized entry handed over by an external fetcher (RSS, Nitter, web page).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedEntry {
    pub source: String,    // display name, e.g. "@macro_trader"
    pub source_id: String, // key into the trust table
    pub source_type: String,
    pub title: Option<String>,
    pub body: String,
    pub url: Option<String>,
    pub published: Option<String>, // as reported by the feed
}

/// One ingested text unit. Written once by ingestion, annotated once by synthesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawItem {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub raw_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// `null` until processed.
    #[serde(default)]
    pub extracted_signal: Option<ExtractedSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    /// Fields owned by other collaborators; carried through log rewrites.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawItem {
    /// Minimal item, mostly for tests and tooling.
    pub fn bare(
        id: impl Into<String>,
        source: impl Into<String>,
        source_id: impl Into<String>,
        content: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            source_id: source_id.into(),
            source_type: None,
            timestamp: None,
            ingested_at: None,
            title: None,
            raw_content: content.map(str::to_string),
            url: None,
            extracted_signal: None,
            processed_at: None,
            extra: Map::new(),
        }
    }

    pub fn is_processed(&self) -> bool {
        self.extracted_signal.is_some()
    }

    /// Content to analyze; empty when absent.
    pub fn content(&self) -> &str {
        self.raw_content.as_deref().unwrap_or_default()
    }

    /// Name recorded in thesis `sources`: the display name, else the source id.
    pub fn contributor(&self) -> &str {
        if self.source.trim().is_empty() {
            &self.source_id
        } else {
            &self.source
        }
    }
}

/// Writers upstream emit `null` for unknown sources; treat it like a missing key.
fn null_as_empty<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}
