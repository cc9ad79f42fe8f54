//! Worked examples for extraction and aggregation, driven through real text.

use chrono::{DateTime, Duration, TimeZone, Utc};
use worldview_synthesis::{
    Aggregator, Direction, RawItem, SignalExtractor, SourceTrustTable, Stance, ThesisStatus,
    Worldview,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap()
}

fn trust() -> SourceTrustTable {
    SourceTrustTable::default()
        .with_source("tw_macro_desk", 0.8)
        .with_source("ss_weekly_flows", 0.85)
}

/// Extract and attach a signal, as the cycle does.
fn processed(id: &str, source: &str, source_id: &str, text: &str) -> RawItem {
    let mut item = RawItem::bare(id, source, source_id, Some(text));
    let sig = SignalExtractor::default().extract(&item, &trust());
    item.extracted_signal = Some(sig);
    item
}

#[test]
fn breakout_post_opens_long_btc_thesis() {
    let item = processed(
        "alpha_a",
        "@macro_desk",
        "tw_macro_desk",
        "Bullish breakout on $BTC, accumulate now",
    );
    let sig = item.extracted_signal.clone().unwrap();
    assert_eq!(sig.direction, Direction::Long);
    assert_eq!(sig.primary_asset.as_deref(), Some("BTC"));
    assert_eq!(sig.bullish_signals, 3);
    assert_eq!(sig.bearish_signals, 0);
    assert!((sig.confidence - 0.72).abs() < 1e-9);

    let (wv, changed) = Aggregator::default().update(Worldview::seed(t0()), &[item], t0());
    assert!(changed);
    assert_eq!(wv.version, 2);
    let t = wv.active_thesis("BTC").expect("BTC thesis");
    assert_eq!(t.direction, Direction::Long);
    assert_eq!(t.status, ThesisStatus::Watching);
    assert_eq!(t.thesis, "LONG BTC based on alpha signals");
    assert!(t.id.starts_with("thesis_btc_"));
}

#[test]
fn second_strong_signal_blends_into_existing_thesis() {
    let a = processed(
        "alpha_a",
        "@macro_desk",
        "tw_macro_desk",
        "Bullish breakout on $BTC, accumulate now",
    );
    let b = processed(
        "alpha_b",
        "Weekly Flows",
        "ss_weekly_flows",
        "Bitcoin rally, buy $BTC for upside",
    );
    let sb = b.extracted_signal.clone().unwrap();
    assert_eq!(sb.bullish_signals, 3);
    assert!((sb.confidence - 0.75).abs() < 1e-9);
    assert_eq!(sb.all_assets, vec!["BTC".to_string(), "BITCOIN".to_string()]);

    let (wv, changed) = Aggregator::default().update(Worldview::seed(t0()), &[a, b], t0());
    assert!(changed);

    let btc: Vec<_> = wv.active_theses.iter().filter(|t| t.asset == "BTC").collect();
    assert_eq!(btc.len(), 1);
    assert!((btc[0].confidence - 0.732).abs() < 1e-9);
    assert_eq!(
        btc[0].sources,
        vec!["@macro_desk".to_string(), "Weekly Flows".to_string()]
    );
    assert_eq!(btc[0].status, ThesisStatus::Watching);

    let crypto = wv.sector(worldview_synthesis::Sector::CryptoAi);
    assert_eq!(crypto.stance, Stance::Bullish);
    assert!(crypto.confidence > 0.5 && crypto.confidence <= 0.9);
}

#[test]
fn empty_batch_leaves_worldview_untouched() {
    let wv = Worldview::seed(t0());
    let (out, changed) = Aggregator::default().update(wv.clone(), &[], t0() + Duration::hours(1));
    assert!(!changed);
    assert_eq!(out, wv);
}

#[test]
fn keyword_balance_needs_a_two_keyword_lead() {
    let ex = SignalExtractor::default();
    let tbl = SourceTrustTable::default();
    let dir = |text: &str| ex.extract(&RawItem::bare("x", "s", "s", Some(text)), &tbl).direction;

    // 3 vs 3
    assert_eq!(dir("bullish rally gem but bearish dump crash"), Direction::Neutral);
    // 4 vs 2
    assert_eq!(dir("bullish rally gem moon, some dump and crash"), Direction::Long);
    // 3 vs 2
    assert_eq!(dir("bullish rally gem, dump and crash"), Direction::Neutral);
}

#[test]
fn weak_or_neutral_signals_only_move_sectors() {
    // Unknown source (trust 0.5) with two bearish words: 0.3 + 0.16 = 0.46.
    let item = processed("alpha_c", "anon", "anon", "Dump $SNAP, crash incoming");
    let sig = item.extracted_signal.clone().unwrap();
    assert_eq!(sig.direction, Direction::Short);
    assert!((sig.confidence - 0.46).abs() < 1e-9);

    let (wv, changed) = Aggregator::default().update(Worldview::seed(t0()), &[item], t0());
    assert!(changed);
    assert!(wv.active_theses.is_empty());
    assert_eq!(
        wv.sector(worldview_synthesis::Sector::SocialMedia).stance,
        Stance::Bearish
    );
    assert_eq!(
        wv.sector(worldview_synthesis::Sector::TradEquities).stance,
        Stance::Bearish
    );
}
