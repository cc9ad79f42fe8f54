//! # Worldview Aggregator
//! Pure fold of one batch of signalled items into the previous worldview.
//! No I/O: the caller persists the result (and appends history) only when
//! the fold reports a change.
//!
//! Policy:
//! - Sector stances move by exponential smoothing (70% memory) so a single
//!   cycle cannot swing them far.
//! - Strong signals (confidence > 0.7) with a primary asset feed theses:
//!   blended into the asset's open thesis, or opening a new `watching` one
//!   when the signal has a direction.

use chrono::{DateTime, Utc};
use serde_json::Map;
use std::collections::BTreeMap;

use crate::extract::{round3, Direction, ExtractedSignal, MAX_SIGNAL_CONFIDENCE, MIN_SIGNAL_CONFIDENCE};
use crate::ingest::types::RawItem;
use crate::lexicon::Lexicon;
use crate::sector::{classify, Sector};
use crate::worldview::{
    short_hash, state_id_for, SectorView, Stance, Thesis, ThesisStatus, Worldview,
    MAX_SECTOR_CONFIDENCE, MIN_SECTOR_CONFIDENCE,
};

/// Signals must exceed this confidence to open or move a thesis.
pub const THESIS_MIN_CONFIDENCE: f64 = 0.7;
/// One side's weight must beat the other's by this factor to set a stance.
const STANCE_MARGIN: f64 = 1.2;
const SECTOR_MEMORY: f64 = 0.7;
const THESIS_MEMORY: f64 = 0.6;

/// What one fold touched. `changed()` decides whether a new version is cut.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateStats {
    pub sectors_updated: Vec<Sector>,
    pub theses_created: usize,
    pub theses_updated: usize,
}

impl UpdateStats {
    pub fn changed(&self) -> bool {
        !self.sectors_updated.is_empty() || self.theses_created > 0 || self.theses_updated > 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    lexicon: Lexicon,
}

impl Aggregator {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// `(worldview', changed)`. When nothing met an update criterion the input
    /// comes back verbatim.
    pub fn update(&self, worldview: Worldview, items: &[RawItem], now: DateTime<Utc>) -> (Worldview, bool) {
        let (wv, stats) = self.update_with_stats(worldview, items, now);
        (wv, stats.changed())
    }

    pub fn update_with_stats(
        &self,
        mut wv: Worldview,
        items: &[RawItem],
        now: DateTime<Utc>,
    ) -> (Worldview, UpdateStats) {
        let mut stats = UpdateStats::default();
        if items.is_empty() {
            return (wv, stats);
        }

        let signalled: Vec<(&RawItem, &ExtractedSignal)> = items
            .iter()
            .filter_map(|it| it.extracted_signal.as_ref().map(|s| (it, s)))
            .collect();

        // 1) Sector sentiment
        let mut buckets: BTreeMap<Sector, Vec<(Direction, f64)>> = BTreeMap::new();
        for (_, s) in &signalled {
            for asset in &s.all_assets {
                for sector in classify(&self.lexicon, asset) {
                    buckets
                        .entry(sector)
                        .or_default()
                        .push((s.direction, s.confidence));
                }
            }
        }
        for (sector, pairs) in buckets {
            if let Some(view) = smoothed_view(wv.sector(sector), &pairs) {
                wv.sector_views.insert(sector, view);
                stats.sectors_updated.push(sector);
            }
        }

        // 2) Theses, in processing order
        for (item, s) in &signalled {
            if s.confidence <= THESIS_MIN_CONFIDENCE {
                continue;
            }
            let Some(asset) = s.primary_asset.as_deref() else {
                continue;
            };
            let contributor = item.contributor();

            if let Some(t) = wv.active_thesis_mut(asset) {
                t.confidence = round3(t.confidence * THESIS_MEMORY + s.confidence * (1.0 - THESIS_MEMORY))
                    .clamp(MIN_SIGNAL_CONFIDENCE, MAX_SIGNAL_CONFIDENCE);
                if !contributor.is_empty() && !t.sources.iter().any(|x| x == contributor) {
                    t.sources.push(contributor.to_string());
                }
                t.last_updated = now;
                stats.theses_updated += 1;
            } else if s.direction != Direction::Neutral {
                let id = thesis_id(asset, &wv.state_id, wv.active_theses.len(), now);
                let sources = if contributor.is_empty() {
                    Vec::new()
                } else {
                    vec![contributor.to_string()]
                };
                wv.active_theses.push(Thesis {
                    id,
                    asset: asset.to_string(),
                    thesis: format!(
                        "{} {} based on alpha signals",
                        s.direction.as_str().to_uppercase(),
                        asset
                    ),
                    direction: s.direction,
                    confidence: s.confidence,
                    sources,
                    status: ThesisStatus::Watching,
                    created: now,
                    last_updated: now,
                    trade_id: None,
                    extra: Map::new(),
                });
                stats.theses_created += 1;
            }
        }

        // 3) Cut a new version
        if stats.changed() {
            wv.ensure_sectors();
            let version = wv.version + 1;
            wv.state_id = state_id_for(&wv.state_id, version, now);
            wv.version = version;
            wv.last_updated = now;
        }

        (wv, stats)
    }
}

/// New sector view from bucketed `(direction, confidence)` pairs, or `None`
/// when the bucket carries no directional weight.
fn smoothed_view(old: SectorView, pairs: &[(Direction, f64)]) -> Option<SectorView> {
    let weight = |want: Direction| -> f64 {
        pairs
            .iter()
            .filter(|(d, _)| *d == want)
            .map(|(_, c)| *c)
            .sum()
    };
    let bullish = weight(Direction::Long);
    let bearish = weight(Direction::Short);
    let total = bullish + bearish;
    if total <= 0.0 {
        return None;
    }

    let raw = (bullish.max(bearish) / (total + 1.0)).clamp(MIN_SECTOR_CONFIDENCE, MAX_SECTOR_CONFIDENCE);
    let stance = if bullish > bearish * STANCE_MARGIN {
        Stance::Bullish
    } else if bearish > bullish * STANCE_MARGIN {
        Stance::Bearish
    } else {
        Stance::Neutral
    };

    let confidence = round3(old.confidence * SECTOR_MEMORY + raw * (1.0 - SECTOR_MEMORY))
        .clamp(MIN_SECTOR_CONFIDENCE, MAX_SECTOR_CONFIDENCE);

    Some(SectorView { stance, confidence })
}

fn thesis_id(asset: &str, state_id: &str, ordinal: usize, now: DateTime<Utc>) -> String {
    let tag = short_hash(&format!("{asset}:{state_id}:{ordinal}:{}", now.to_rfc3339()), 3);
    format!("thesis_{}_{}", asset.to_lowercase(), tag)
}
