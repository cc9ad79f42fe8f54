// src/ingest/mod.rs
//! Ingestion side of the item log: normalizes feed entries handed over by
//! external fetchers into `RawItem`s with stable ids and appends the unseen ones.

pub mod types;

use chrono::{DateTime, Utc};
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::Map;
use sha2::{Digest, Sha256};

use crate::ingest::types::{FeedEntry, RawItem};
use crate::store::items::ItemLog;

/// Body length cap after normalization.
pub const MAX_BODY_CHARS: usize = 1000;

/// Normalize text: decode entities, strip tags, collapse whitespace, cap length.
pub fn normalize_text(s: &str, max_chars: usize) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("ws regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > max_chars {
        out = out.chars().take(max_chars).collect();
    }

    out
}

/// `alpha_` + 12 hex chars of SHA-256 over `source_id:first 100 chars:published`.
pub fn item_id(source_id: &str, content: &str, published: &str) -> String {
    let head: String = content.chars().take(100).collect();
    let mut hasher = Sha256::new();
    hasher.update(format!("{source_id}:{head}:{published}").as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(18);
    out.push_str("alpha_");
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

impl RawItem {
    /// Build an unprocessed item from a feed entry. `raw_content` is the title
    /// and body separated by a blank line.
    pub fn from_entry(entry: FeedEntry, now: DateTime<Utc>) -> Self {
        let title = entry
            .title
            .as_deref()
            .map(|t| normalize_text(t, MAX_BODY_CHARS))
            .filter(|t| !t.is_empty());
        let body = normalize_text(&entry.body, MAX_BODY_CHARS);

        let published = entry.published.unwrap_or_else(|| now.to_rfc3339());
        let id = item_id(
            &entry.source_id,
            &format!("{}{}", title.as_deref().unwrap_or_default(), body),
            &published,
        );

        let raw_content = match &title {
            Some(t) if body.is_empty() => t.clone(),
            Some(t) => format!("{t}\n\n{body}"),
            None => body,
        };

        Self {
            id,
            source: entry.source,
            source_id: entry.source_id,
            source_type: Some(entry.source_type),
            timestamp: Some(now),
            ingested_at: Some(now),
            title,
            raw_content: Some(raw_content),
            url: entry.url,
            extracted_signal: None,
            processed_at: None,
            extra: Map::new(),
        }
    }
}

/// Outcome of one ingest pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub kept: usize,
    pub empty: usize,
    pub duplicates: usize,
}

/// Normalize entries and append the ones whose id the log has not seen.
/// The log is not flushed here.
pub fn ingest_entries(log: &mut ItemLog, entries: Vec<FeedEntry>, now: DateTime<Utc>) -> IngestReport {
    let mut report = IngestReport::default();
    for entry in entries {
        let item = RawItem::from_entry(entry, now);
        if item.content().is_empty() {
            report.empty += 1;
            continue;
        }
        let id = item.id.clone();
        if log.append(item) {
            tracing::debug!(target: "item_log", %id, "item ingested");
            report.kept += 1;
        } else {
            report.duplicates += 1;
        }
    }

    counter!("ingest_items_kept_total").increment(report.kept as u64);
    counter!("ingest_items_duplicate_total").increment(report.duplicates as u64);

    report
}
