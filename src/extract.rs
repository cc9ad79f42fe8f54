//! # Signal Extraction
//! Pure, deterministic mapping `(item, trust table) → ExtractedSignal`.
//! No I/O; the caller decides when (and whether) to attach the result.
//!
//! Direction uses a one-keyword hysteresis band: it takes at least two more
//! keywords on one side than the other to leave `neutral`.

use serde::{Deserialize, Serialize};

use crate::ingest::types::RawItem;
use crate::lexicon::Lexicon;
use crate::source_trust::SourceTrustTable;

pub const MIN_SIGNAL_CONFIDENCE: f64 = 0.1;
pub const MAX_SIGNAL_CONFIDENCE: f64 = 0.95;

const TRUST_WEIGHT: f64 = 0.6;
const STRENGTH_WEIGHT: f64 = 0.4;
/// Keyword count at which signal strength saturates.
const STRENGTH_SATURATION: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
    #[default]
    Neutral,
}

impl Direction {
    /// `long` iff bullish > bearish + 1, `short` iff bearish > bullish + 1.
    pub fn from_counts(bullish: usize, bearish: usize) -> Self {
        if bullish > bearish + 1 {
            Direction::Long
        } else if bearish > bullish + 1 {
            Direction::Short
        } else {
            Direction::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
            Direction::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal attached 1:1 to a processed item. The raw counters are kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSignal {
    pub direction: Direction,
    #[serde(rename = "asset", alias = "primary_asset", default)]
    pub primary_asset: Option<String>,
    #[serde(default)]
    pub all_assets: Vec<String>,
    pub confidence: f64,
    #[serde(default)]
    pub bullish_signals: usize,
    #[serde(default)]
    pub bearish_signals: usize,
    #[serde(default)]
    pub source_trust: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SignalExtractor {
    lexicon: Lexicon,
}

impl SignalExtractor {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn extract(&self, item: &RawItem, trust: &SourceTrustTable) -> ExtractedSignal {
        let content = item.content();
        let lowered = content.to_lowercase();

        let (bullish, bearish) = self.lexicon.keyword_counts(&lowered);
        let direction = Direction::from_counts(bullish, bearish);

        let all_assets = self.lexicon.scan_assets(content);
        let primary_asset = all_assets.first().cloned();

        let source_trust = trust.trust_for(&item.source_id);
        let confidence = confidence_for(source_trust, bullish.max(bearish));

        ExtractedSignal {
            direction,
            primary_asset,
            all_assets,
            confidence,
            bullish_signals: bullish,
            bearish_signals: bearish,
            source_trust,
        }
    }
}

/// `clamp(trust*0.6 + strength*0.4, 0.1, 0.95)` rounded to 3 decimals.
pub fn confidence_for(source_trust: f64, dominant_count: usize) -> f64 {
    let strength = (dominant_count as f64 / STRENGTH_SATURATION).min(1.0);
    let raw = source_trust * TRUST_WEIGHT + strength * STRENGTH_WEIGHT;
    round3(raw.clamp(MIN_SIGNAL_CONFIDENCE, MAX_SIGNAL_CONFIDENCE))
}

pub(crate) fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
