//! # Trade Signals
//! Turns tradeable theses into sized signals and pending trade records.
//!
//! Gate order: drawdown limit first (no signals at all once breached), then
//! per thesis: `watching`, confidence ≥ threshold, directional, no open
//! position in the asset. Recording a trade is the only place a thesis moves
//! `watching → trading`.

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::DataPaths;
use crate::error::{Result, SynthesisError};
use crate::extract::Direction;
use crate::store::worldview::WorldviewFile;
use crate::store::StagedFile;
use crate::telemetry::ensure_metrics_described;
use crate::worldview::{short_hash, RiskParams, ThesisStatus, Worldview};

/// Position size, in percent of portfolio, at confidence 1.0.
pub const BASE_POSITION_PCT: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub asset: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub total_value_usd: f64,
    /// Falls back to the current value when absent.
    #[serde(default)]
    pub high_water_mark: Option<f64>,
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub realized_pnl: f64,
    #[serde(default)]
    pub unrealized_pnl: f64,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Portfolio {
    pub fn fresh(capital_usd: f64, now: DateTime<Utc>) -> Self {
        Self {
            total_value_usd: capital_usd,
            high_water_mark: Some(capital_usd),
            positions: Vec::new(),
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            last_updated: Some(now),
            extra: Map::new(),
        }
    }

    pub fn has_position(&self, asset: &str) -> bool {
        self.positions.iter().any(|p| p.asset == asset)
    }

    /// Load `path`, or start a fresh portfolio with `capital_usd`.
    pub fn load_or_seed(path: &Path, capital_usd: f64, now: DateTime<Utc>) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::fresh(capital_usd, now));
        }
        let raw =
            fs::read_to_string(path).map_err(|e| SynthesisError::io("read portfolio", path, e))?;
        serde_json::from_str(&raw).map_err(|e| SynthesisError::Decode {
            path: path.to_path_buf(),
            line: e.line(),
            source: e,
        })
    }

    pub fn save(&mut self, path: &Path, now: DateTime<Utc>) -> Result<()> {
        self.last_updated = Some(now);
        let body = serde_json::to_string_pretty(self).map_err(|e| SynthesisError::Encode {
            what: "portfolio",
            source: e,
        })?;
        StagedFile::write(path, body.as_bytes())?.commit()
    }
}

/// `(within_limit, drawdown_pct)`; drawdown is measured from the high-water mark.
pub fn check_drawdown(portfolio: &Portfolio, risk: &RiskParams) -> (bool, f64) {
    let current = portfolio.total_value_usd;
    let hwm = portfolio.high_water_mark.unwrap_or(current);
    let drawdown = if hwm > 0.0 {
        (hwm - current) / hwm * 100.0
    } else {
        0.0
    };
    (drawdown < risk.max_drawdown_pct, drawdown)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    #[default]
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub signal_id: String,
    pub thesis_id: String,
    pub asset: String,
    pub direction: Direction,
    pub action: Action,
    pub size_pct: f64,
    pub confidence: f64,
    pub rationale: String,
    pub sources: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub status: SignalStatus,
}

/// Signals for every tradeable thesis, or none when the drawdown limit is hit.
pub fn generate_signals(wv: &Worldview, portfolio: &Portfolio, now: DateTime<Utc>) -> Vec<TradeSignal> {
    let risk = &wv.risk_params;
    let (within, dd) = check_drawdown(portfolio, risk);
    if !within {
        tracing::warn!(
            target: "execution",
            drawdown_pct = dd,
            limit_pct = risk.max_drawdown_pct,
            "drawdown limit reached, no new signals"
        );
        return Vec::new();
    }

    let signals: Vec<TradeSignal> = wv
        .tradeable_theses()
        .filter(|t| t.direction != Direction::Neutral && !t.asset.is_empty())
        .filter(|t| !portfolio.has_position(&t.asset))
        .map(|t| {
            let size_pct = round_to(
                (BASE_POSITION_PCT * t.confidence).min(risk.max_position_pct),
                1,
            );
            TradeSignal {
                signal_id: format!(
                    "sig_{}",
                    short_hash(&format!("{}_{}_{}", t.asset, t.id, now.to_rfc3339()), 4)
                ),
                thesis_id: t.id.clone(),
                asset: t.asset.clone(),
                direction: t.direction,
                action: if t.direction == Direction::Long {
                    Action::Buy
                } else {
                    Action::Sell
                },
                size_pct,
                confidence: t.confidence,
                rationale: t.thesis.clone(),
                sources: t.sources.clone(),
                generated_at: now,
                status: SignalStatus::Pending,
            }
        })
        .collect();

    counter!("execution_signals_generated_total").increment(signals.len() as u64);
    signals
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// The asset itself (or its wrapped form) is tradeable on the venue.
    Direct,
    /// A correlated stand-in is traded instead.
    Proxy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub executed_asset: &'static str,
    pub kind: RouteKind,
}

/// Venue instrument for `asset`. `None` when the asset is known but has no
/// listing; anything unknown is proxied through WETH as general risk-on.
pub fn route_asset(asset: &str) -> Option<Route> {
    let direct = |executed_asset: &'static str| {
        Some(Route {
            executed_asset,
            kind: RouteKind::Direct,
        })
    };
    match asset {
        "BTC" => direct("WBTC"),
        "ETH" => direct("WETH"),
        "LINK" => direct("LINK"),
        "UNI" => direct("UNI"),
        "AAVE" => direct("AAVE"),
        "SOL" | "AVAX" => None,
        _ => Some(Route {
            executed_asset: "WETH",
            kind: RouteKind::Proxy,
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    #[default]
    PendingExecution,
    Executed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: String,
    pub signal_id: String,
    pub thesis_id: String,
    pub original_asset: String,
    pub executed_asset: String,
    pub mapping_type: RouteKind,
    pub action: Action,
    pub direction: Direction,
    pub size_pct: f64,
    pub trade_value_usd: f64,
    pub entry_price: Option<f64>,
    pub status: TradeStatus,
    pub rationale: String,
    pub sources: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    pub tx_hash: Option<String>,
}

/// Build pending trade records for `signals` and move their theses to
/// `trading`. Signals without a venue route, or whose thesis is no longer
/// `watching`, are skipped.
pub fn record_trades(
    wv: &mut Worldview,
    portfolio: &Portfolio,
    signals: &[TradeSignal],
    now: DateTime<Utc>,
) -> Vec<TradeRecord> {
    let mut trades = Vec::with_capacity(signals.len());
    for sig in signals {
        let Some(route) = route_asset(&sig.asset) else {
            tracing::info!(target: "execution", asset = %sig.asset, "no venue route, signal skipped");
            continue;
        };
        let watching = wv
            .active_theses
            .iter()
            .any(|t| t.id == sig.thesis_id && t.status == ThesisStatus::Watching);
        if !watching {
            continue;
        }

        let trade_id = format!(
            "trade_{}",
            short_hash(&format!("{}:{}", sig.signal_id, now.to_rfc3339()), 4)
        );
        wv.mark_trading(&sig.thesis_id, &trade_id);

        let record = TradeRecord {
            trade_id,
            signal_id: sig.signal_id.clone(),
            thesis_id: sig.thesis_id.clone(),
            original_asset: sig.asset.clone(),
            executed_asset: route.executed_asset.to_string(),
            mapping_type: route.kind,
            action: sig.action,
            direction: sig.direction,
            size_pct: sig.size_pct,
            trade_value_usd: round_to(portfolio.total_value_usd * sig.size_pct / 100.0, 2),
            entry_price: None,
            status: TradeStatus::PendingExecution,
            rationale: sig.rationale.clone(),
            sources: sig.sources.clone(),
            generated_at: sig.generated_at,
            executed_at: None,
            tx_hash: None,
        };
        tracing::info!(
            target: "execution",
            trade_id = %record.trade_id,
            action = ?record.action,
            asset = %record.original_asset,
            executed = %record.executed_asset,
            value_usd = record.trade_value_usd,
            "trade recorded"
        );
        trades.push(record);
    }
    trades
}

/// Append-only trade log (JSONL).
#[derive(Debug, Clone)]
pub struct TradeLedger {
    path: PathBuf,
}

impl TradeLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append_all(&self, trades: &[TradeRecord]) -> Result<()> {
        if trades.is_empty() {
            return Ok(());
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| SynthesisError::io("create directory", dir, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SynthesisError::io("open trade ledger", &self.path, e))?;
        let mut w = BufWriter::new(file);
        for t in trades {
            let line = serde_json::to_string(t).map_err(|e| SynthesisError::Encode {
                what: "trade",
                source: e,
            })?;
            writeln!(w, "{line}").map_err(|e| SynthesisError::io("append trade", &self.path, e))?;
        }
        w.flush()
            .map_err(|e| SynthesisError::io("append trade", &self.path, e))
    }

    pub fn read_all(&self) -> Result<Vec<TradeRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| SynthesisError::io("read trade ledger", &self.path, e))?;
        raw.lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(n, l)| {
                serde_json::from_str(l).map_err(|e| SynthesisError::Decode {
                    path: self.path.clone(),
                    line: n + 1,
                    source: e,
                })
            })
            .collect()
    }
}

/// Replace the pending-signals file with `signals` (possibly empty).
pub fn write_pending_signals(path: &Path, signals: &[TradeSignal]) -> Result<()> {
    let body = serde_json::to_string_pretty(signals).map_err(|e| SynthesisError::Encode {
        what: "pending signals",
        source: e,
    })?;
    StagedFile::write(path, body.as_bytes())?.commit()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub drawdown_pct: f64,
    pub signals: usize,
    pub trades: usize,
}

/// Full execution pass over the live worldview: signals, trade records,
/// thesis status updates, pending-signals file.
pub fn run_execution(paths: &DataPaths, initial_capital_usd: f64, now: DateTime<Utc>) -> Result<ExecutionReport> {
    ensure_metrics_described();

    let wv_file = WorldviewFile::new(&paths.worldview);
    let mut wv = wv_file.load_required()?;
    let portfolio = Portfolio::load_or_seed(&paths.portfolio, initial_capital_usd, now)?;
    let (_, drawdown_pct) = check_drawdown(&portfolio, &wv.risk_params);

    let signals = generate_signals(&wv, &portfolio, now);
    let trades = record_trades(&mut wv, &portfolio, &signals, now);

    let staged_wv = if trades.is_empty() {
        None
    } else {
        Some(wv_file.stage(&wv)?)
    };
    TradeLedger::new(&paths.trades).append_all(&trades)?;
    if let Some(staged) = staged_wv {
        staged.commit()?;
    }
    write_pending_signals(&paths.pending_signals, &signals)?;

    tracing::info!(
        target: "execution",
        portfolio_usd = portfolio.total_value_usd,
        drawdown_pct,
        signals = signals.len(),
        trades = trades.len(),
        "execution pass complete"
    );

    Ok(ExecutionReport {
        drawdown_pct,
        signals: signals.len(),
        trades: trades.len(),
    })
}

fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}
