//! Tracing subscriber setup and metric descriptions.

use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "synthesis=info,execution=info,warn";

/// Install the global subscriber. Filter comes from `RUST_LOG`; set
/// `LOG_FORMAT=json` for one JSON object per event. A second call is a no-op.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

/// One-time metrics registration.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "synthesis_items_processed_total",
            "Items annotated with an extracted signal."
        );
        describe_counter!("synthesis_cycles_total", "Completed synthesis cycles.");
        describe_counter!(
            "synthesis_worldview_changes_total",
            "Cycles that produced a new worldview version."
        );
        describe_counter!(
            "synthesis_theses_created_total",
            "Theses opened by the aggregator."
        );
        describe_gauge!(
            "synthesis_worldview_version",
            "Version of the live worldview."
        );
        describe_counter!(
            "execution_signals_generated_total",
            "Trade signals emitted from tradeable theses."
        );
        describe_counter!("ingest_items_kept_total", "Feed entries appended to the item log.");
        describe_counter!(
            "ingest_items_duplicate_total",
            "Feed entries dropped because their id was already logged."
        );
    });
}
