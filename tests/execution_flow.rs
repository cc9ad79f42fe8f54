//! Synthesis followed by the trade-signal pass, over a temp data directory.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::fs;

use worldview_synthesis::execution::{
    run_execution, Action, Portfolio, Position, TradeLedger, TradeSignal, TradeStatus,
};
use worldview_synthesis::ingest::ingest_entries;
use worldview_synthesis::store::items::ItemLog;
use worldview_synthesis::store::worldview::WorldviewFile;
use worldview_synthesis::{run_synthesis, DataPaths, FeedEntry, Lexicon, ThesisStatus, Worldview};

const CAPITAL: f64 = 2084.58;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap()
}

fn post(body: &str, published: &str) -> FeedEntry {
    FeedEntry {
        source: "@macro_desk".into(),
        source_id: "tw_macro_desk".into(),
        source_type: "twitter".into(),
        title: None,
        body: body.into(),
        url: None,
        published: Some(published.into()),
    }
}

fn ingest(paths: &DataPaths, entries: Vec<FeedEntry>, now: DateTime<Utc>) {
    let mut log = ItemLog::open(&paths.items).unwrap();
    ingest_entries(&mut log, entries, now);
    log.flush().unwrap();
}

#[test]
fn strong_thesis_becomes_one_pending_trade() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::under(&dir.path().join("data"), &dir.path().join("logs"));
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(
        &paths.source_weights,
        r#"{"sources":{"twitter":[{"id":"tw_macro_desk","trust":0.8}]}}"#,
    )
    .unwrap();
    WorldviewFile::new(&paths.worldview)
        .save(&Worldview::seed(t0()))
        .unwrap();
    let lex = Lexicon::builtin();

    ingest(
        &paths,
        vec![post("Bullish breakout on $BTC, accumulate now", "p1")],
        t0(),
    );
    run_synthesis(&paths, &lex, t0()).unwrap();

    let exec = run_execution(&paths, CAPITAL, t0() + Duration::minutes(1)).unwrap();
    assert_eq!(exec.signals, 1);
    assert_eq!(exec.trades, 1);
    assert_eq!(exec.drawdown_pct, 0.0);

    let trades = TradeLedger::new(&paths.trades).read_all().unwrap();
    assert_eq!(trades.len(), 1);
    let trade = &trades[0];
    assert_eq!(trade.action, Action::Buy);
    assert_eq!(trade.executed_asset, "WBTC");
    assert_eq!(trade.status, TradeStatus::PendingExecution);
    // 20 * 0.72 = 14.4% of 2084.58
    assert!((trade.size_pct - 14.4).abs() < 1e-9);
    assert!((trade.trade_value_usd - 300.18).abs() < 1e-9);

    let pending: Vec<TradeSignal> =
        serde_json::from_str(&fs::read_to_string(&paths.pending_signals).unwrap()).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].signal_id, trade.signal_id);

    let wv = WorldviewFile::new(&paths.worldview).load_required().unwrap();
    let btc = wv.active_thesis("BTC").unwrap();
    assert_eq!(btc.status, ThesisStatus::Trading);
    assert_eq!(btc.trade_id.as_deref(), Some(trade.trade_id.as_str()));

    // Nothing left to trade on a second pass.
    let again = run_execution(&paths, CAPITAL, t0() + Duration::minutes(2)).unwrap();
    assert_eq!(again.signals, 0);
    assert_eq!(TradeLedger::new(&paths.trades).read_all().unwrap().len(), 1);
    let pending: Vec<TradeSignal> =
        serde_json::from_str(&fs::read_to_string(&paths.pending_signals).unwrap()).unwrap();
    assert!(pending.is_empty());

    // Later synthesis keeps the thesis in `trading` while blending confidence.
    ingest(
        &paths,
        vec![post("Bullish rally on $BTC, accumulate more", "p2")],
        t0() + Duration::minutes(30),
    );
    let report = run_synthesis(&paths, &lex, t0() + Duration::minutes(30)).unwrap();
    assert_eq!(report.processed, 1);
    let wv = WorldviewFile::new(&paths.worldview).load_required().unwrap();
    let btc = wv.active_thesis("BTC").unwrap();
    assert_eq!(btc.status, ThesisStatus::Trading);
    assert_eq!(btc.trade_id.as_deref(), Some(trade.trade_id.as_str()));
    assert!((btc.confidence - 0.72).abs() < 1e-9);
}

#[test]
fn portfolio_round_trips_and_respects_positions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("portfolio.json");

    let fresh = Portfolio::load_or_seed(&path, CAPITAL, t0()).unwrap();
    assert_eq!(fresh.high_water_mark, Some(CAPITAL));
    assert!(fresh.positions.is_empty());

    let mut p = fresh.clone();
    p.positions.push(Position {
        asset: "ETH".into(),
        extra: serde_json::from_str(r#"{"entry_price": 2500.0}"#).unwrap(),
    });
    p.save(&path, t0() + Duration::hours(1)).unwrap();

    let loaded = Portfolio::load_or_seed(&path, 1.0, t0()).unwrap();
    assert!(loaded.has_position("ETH"));
    assert!(!loaded.has_position("BTC"));
    assert_eq!(loaded.positions[0].extra["entry_price"], serde_json::json!(2500.0));
    assert_eq!(loaded.last_updated, Some(t0() + Duration::hours(1)));
    assert!((loaded.total_value_usd - CAPITAL).abs() < 1e-9);
}
