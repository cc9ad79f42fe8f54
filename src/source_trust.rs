//! # Source Trust
//!
//! Read-only mapping from a source identifier to a trust weight in `[0.0, 1.0]`.
//!
//! The JSON file groups sources by category (twitter, substack, telegram,
//! websites, ...). Categories are opaque here: every category is searched and
//! the first entry with a matching `id` wins. Unknown sources trust `0.5`.
//!
//! ```json
//! { "sources": { "twitter": [ { "id": "tw_macro", "handle": "@macro", "trust": 0.8 } ] } }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::BTreeMap, collections::HashMap, fs, path::Path};

/// Trust applied to sources missing from the table, or entries without `trust`.
pub const DEFAULT_TRUST: f64 = 0.5;

/// On-disk shape of the source weights file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceWeightsFile {
    #[serde(default)]
    pub sources: BTreeMap<String, Vec<SourceEntry>>,
}

/// One configured source. Only `id` and `trust` matter for synthesis; the
/// rest describes where ingestion fetches it from.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    pub id: String,
    #[serde(default)]
    pub trust: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub rss: Option<String>,
}

/// Lookup table built once per cycle.
#[derive(Debug, Clone, Default)]
pub struct SourceTrustTable {
    by_id: HashMap<String, f64>,
}

impl SourceTrustTable {
    pub fn from_file_shape(file: SourceWeightsFile) -> Self {
        let mut by_id = HashMap::new();
        for entries in file.sources.into_values() {
            for e in entries {
                let trust = clamp01(e.trust.unwrap_or(DEFAULT_TRUST));
                by_id.entry(e.id.trim().to_string()).or_insert(trust);
            }
        }
        Self { by_id }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let file: SourceWeightsFile =
            serde_json::from_str(s).context("parsing source weights json")?;
        Ok(Self::from_file_shape(file))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading source weights from {}", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Like `load_from_file`, but a missing or invalid file yields an empty
    /// table (every source then trusts `DEFAULT_TRUST`).
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_from_file(&path) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(target: "synthesis", error = %format!("{e:#}"), "source weights unavailable, using default trust");
                Self::default()
            }
        }
    }

    /// Insert or replace one entry. Handy for tests and tooling.
    pub fn with_source(mut self, id: impl Into<String>, trust: f64) -> Self {
        self.by_id.insert(id.into(), clamp01(trust));
        self
    }

    pub fn trust_for(&self, source_id: &str) -> f64 {
        self.by_id
            .get(source_id.trim())
            .copied()
            .unwrap_or(DEFAULT_TRUST)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        DEFAULT_TRUST
    } else {
        x.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "sources": {
            "twitter": [
                {"id": "tw_1", "handle": "@trader", "trust": 0.8},
                {"id": "tw_2", "handle": "@noisy"}
            ],
            "substack": [
                {"id": "ss_1", "name": "Macro Letter", "rss": "https://x/feed", "trust": 0.9}
            ],
            "podcasts": [
                {"id": "pc_1", "name": "Odd Lots", "trust": 1.7}
            ]
        }
    }"#;

    #[test]
    fn searches_every_category() {
        let t = SourceTrustTable::from_json_str(SAMPLE).unwrap();
        assert!((t.trust_for("tw_1") - 0.8).abs() < 1e-9);
        assert!((t.trust_for("ss_1") - 0.9).abs() < 1e-9);
        // category unknown to ingestion still counts
        assert!((t.trust_for("pc_1") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn default_trust_for_unknown_or_unset() {
        let t = SourceTrustTable::from_json_str(SAMPLE).unwrap();
        assert!((t.trust_for("tw_2") - DEFAULT_TRUST).abs() < 1e-9);
        assert!((t.trust_for("nobody") - DEFAULT_TRUST).abs() < 1e-9);
        assert!((t.trust_for("") - DEFAULT_TRUST).abs() < 1e-9);
    }

    #[test]
    fn missing_file_falls_back_to_empty() {
        let t = SourceTrustTable::load_or_empty("does/not/exist.json");
        assert!(t.is_empty());
        assert!((t.trust_for("tw_1") - DEFAULT_TRUST).abs() < 1e-9);
    }
}
