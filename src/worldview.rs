//! worldview.rs: the versioned belief state: sector sentiment plus theses.
//!
//! The aggregator owns sector views and thesis confidence/sources; the
//! execution side owns thesis `status` and `trade_id`. `risk_params` and any
//! unknown top-level fields belong to whoever seeded the file and are carried
//! through untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::extract::Direction;
use crate::sector::Sector;

pub const MIN_SECTOR_CONFIDENCE: f64 = 0.3;
pub const MAX_SECTOR_CONFIDENCE: f64 = 0.9;
const SEED_SECTOR_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorView {
    pub stance: Stance,
    pub confidence: f64,
}

impl Default for SectorView {
    fn default() -> Self {
        Self {
            stance: Stance::Neutral,
            confidence: SEED_SECTOR_CONFIDENCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThesisStatus {
    #[default]
    Watching,
    Trading,
    Closed,
}

/// A standing directional belief about one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thesis {
    pub id: String,
    pub asset: String,
    /// Human-readable rationale, e.g. "LONG BTC based on alpha signals".
    #[serde(default)]
    pub thesis: String,
    pub direction: Direction,
    pub confidence: f64,
    /// Contributing source names; grows only, in processing order.
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub status: ThesisStatus,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Thesis {
    pub fn is_active(&self) -> bool {
        self.status != ThesisStatus::Closed
    }
}

/// Risk limits read by the execution side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskParams {
    #[serde(default = "default_max_drawdown_pct")]
    pub max_drawdown_pct: f64,
    #[serde(default = "default_max_position_pct")]
    pub max_position_pct: f64,
    #[serde(default = "default_trade_threshold")]
    pub confidence_threshold_for_trade: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_max_drawdown_pct() -> f64 {
    15.0
}
fn default_max_position_pct() -> f64 {
    100.0
}
fn default_trade_threshold() -> f64 {
    0.65
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            max_drawdown_pct: default_max_drawdown_pct(),
            max_position_pct: default_max_position_pct(),
            confidence_threshold_for_trade: default_trade_threshold(),
            extra: Map::new(),
        }
    }
}

/// Root aggregate. Exactly one is live at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worldview {
    pub state_id: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub sector_views: BTreeMap<Sector, SectorView>,
    /// Creation order.
    #[serde(default)]
    pub active_theses: Vec<Thesis>,
    #[serde(default)]
    pub risk_params: RiskParams,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Worldview {
    /// Fresh worldview: every sector neutral, no theses, version 1.
    pub fn seed(now: DateTime<Utc>) -> Self {
        let mut wv = Self {
            state_id: state_id_for("genesis", 0, now),
            version: 1,
            last_updated: now,
            sector_views: BTreeMap::new(),
            active_theses: Vec::new(),
            risk_params: RiskParams::default(),
            extra: Map::new(),
        };
        wv.ensure_sectors();
        wv
    }

    /// Fill in any missing sector with a neutral view so all five keys exist.
    pub fn ensure_sectors(&mut self) {
        for s in Sector::ALL {
            self.sector_views.entry(s).or_default();
        }
    }

    pub fn sector(&self, s: Sector) -> SectorView {
        self.sector_views.get(&s).copied().unwrap_or_default()
    }

    /// The non-closed thesis for `asset`, if any.
    pub fn active_thesis(&self, asset: &str) -> Option<&Thesis> {
        self.active_theses
            .iter()
            .find(|t| t.is_active() && t.asset == asset)
    }

    pub fn active_thesis_mut(&mut self, asset: &str) -> Option<&mut Thesis> {
        self.active_theses
            .iter_mut()
            .find(|t| t.is_active() && t.asset == asset)
    }

    pub fn thesis_mut(&mut self, id: &str) -> Option<&mut Thesis> {
        self.active_theses.iter_mut().find(|t| t.id == id)
    }

    /// `watching → trading`, recording the trade that opened it.
    pub fn mark_trading(&mut self, thesis_id: &str, trade_id: &str) -> bool {
        match self.thesis_mut(thesis_id) {
            Some(t) if t.status == ThesisStatus::Watching => {
                t.status = ThesisStatus::Trading;
                t.trade_id = Some(trade_id.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn close_thesis(&mut self, thesis_id: &str) -> bool {
        match self.thesis_mut(thesis_id) {
            Some(t) if t.is_active() => {
                t.status = ThesisStatus::Closed;
                true
            }
            _ => false,
        }
    }

    /// Theses the trade-signal generator may act on.
    pub fn tradeable_theses(&self) -> impl Iterator<Item = &Thesis> {
        let threshold = self.risk_params.confidence_threshold_for_trade;
        self.active_theses
            .iter()
            .filter(move |t| t.status == ThesisStatus::Watching && t.confidence >= threshold)
    }
}

/// `state_` + 8 hex chars over the previous id, the new version and the time.
pub fn state_id_for(prev_state_id: &str, version: u64, now: DateTime<Utc>) -> String {
    format!(
        "state_{}",
        short_hash(&format!("{prev_state_id}:{version}:{}", now.to_rfc3339()), 4)
    )
}

pub(crate) fn short_hash(input: &str, bytes: usize) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(bytes * 2);
    for b in digest.iter().take(bytes) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn seed_has_all_sectors() {
        let wv = Worldview::seed(t0());
        assert_eq!(wv.sector_views.len(), 5);
        assert!(wv.state_id.starts_with("state_"));
        assert_eq!(wv.state_id.len(), "state_".len() + 8);
    }

    #[test]
    fn loads_partial_file_and_keeps_unknown_fields() {
        let raw = r#"{
            "state_id": "state_seed",
            "version": 3,
            "last_updated": "2025-09-01T12:00:00+00:00",
            "sector_views": {"crypto_ai": {"stance": "bullish", "confidence": 0.6}},
            "active_theses": [],
            "risk_params": {"max_drawdown_pct": 10, "custom_limit": 2},
            "notes": "seeded by hand"
        }"#;
        let mut wv: Worldview = serde_json::from_str(raw).unwrap();
        wv.ensure_sectors();
        assert_eq!(wv.sector_views.len(), 5);
        assert_eq!(wv.sector(Sector::CryptoAi).stance, Stance::Bullish);
        assert!((wv.risk_params.max_drawdown_pct - 10.0).abs() < 1e-9);
        assert!((wv.risk_params.confidence_threshold_for_trade - 0.65).abs() < 1e-9);

        let back = serde_json::to_value(&wv).unwrap();
        assert_eq!(back["notes"], serde_json::json!("seeded by hand"));
        assert_eq!(back["risk_params"]["custom_limit"], serde_json::json!(2));
        assert_eq!(back["sector_views"]["options"]["stance"], serde_json::json!("neutral"));
    }

    #[test]
    fn status_transitions() {
        let mut wv = Worldview::seed(t0());
        wv.active_theses.push(Thesis {
            id: "thesis_btc_abc123".into(),
            asset: "BTC".into(),
            thesis: "LONG BTC based on alpha signals".into(),
            direction: Direction::Long,
            confidence: 0.8,
            sources: vec!["a".into()],
            status: ThesisStatus::Watching,
            created: t0(),
            last_updated: t0(),
            trade_id: None,
            extra: Map::new(),
        });
        assert_eq!(wv.tradeable_theses().count(), 1);
        assert!(wv.mark_trading("thesis_btc_abc123", "trade_1"));
        assert!(!wv.mark_trading("thesis_btc_abc123", "trade_2"));
        assert_eq!(wv.tradeable_theses().count(), 0);
        assert!(wv.active_thesis("BTC").is_some());
        assert!(wv.close_thesis("thesis_btc_abc123"));
        assert!(wv.active_thesis("BTC").is_none());
    }
}
