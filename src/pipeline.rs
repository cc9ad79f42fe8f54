//! One synthesis cycle: load → extract → aggregate → commit.
//!
//! Commit order matters. The item log and the worldview are staged to temp
//! files first; a failure while staging drops both and leaves live state
//! untouched. Then the worldview is renamed into place, then the item log,
//! and only then is the history entry appended, so the ledger never records
//! a state that did not go live.
//!
//! Two windows remain. If the item-log rename fails after the worldview
//! rename, the items stay unprocessed and a retry folds them in again. If
//! the history append fails, live state is consistent but that version has
//! no ledger entry; the error is still returned.

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};

use crate::aggregate::{Aggregator, UpdateStats};
use crate::config::DataPaths;
use crate::error::Result;
use crate::extract::SignalExtractor;
use crate::lexicon::Lexicon;
use crate::source_trust::SourceTrustTable;
use crate::store::history::StateHistory;
use crate::store::items::ItemLog;
use crate::store::worldview::WorldviewFile;
use crate::telemetry::ensure_metrics_described;

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub processed: usize,
    pub changed: bool,
    pub state_id: String,
    pub version: u64,
    pub active_theses: usize,
    pub stats: UpdateStats,
}

pub fn run_synthesis(paths: &DataPaths, lexicon: &Lexicon, now: DateTime<Utc>) -> Result<CycleReport> {
    ensure_metrics_described();

    let wv_file = WorldviewFile::new(&paths.worldview);
    let worldview = wv_file.load_required()?;
    let trust = SourceTrustTable::load_or_empty(&paths.source_weights);
    let mut log = ItemLog::open(&paths.items)?;

    let pending = log.unprocessed();
    tracing::info!(
        target: "synthesis",
        pending = pending.len(),
        state_id = %worldview.state_id,
        version = worldview.version,
        "synthesis cycle started"
    );

    let extractor = SignalExtractor::new(lexicon.clone());
    let mut batch = Vec::with_capacity(pending.len());
    for mut item in pending {
        let signal = extractor.extract(&item, &trust);
        if !log.annotate(&item.id, signal.clone(), now) {
            continue;
        }
        tracing::debug!(
            target: "synthesis",
            id = %item.id,
            source = %item.source_id,
            direction = %signal.direction,
            asset = signal.primary_asset.as_deref().unwrap_or("-"),
            confidence = signal.confidence,
            "item processed"
        );
        item.extracted_signal = Some(signal);
        item.processed_at = Some(now);
        batch.push(item);
    }
    let processed = batch.len();

    let aggregator = Aggregator::new(lexicon.clone());
    let (worldview, stats) = aggregator.update_with_stats(worldview, &batch, now);
    let changed = stats.changed();

    // Stage everything before touching live files.
    let staged_items = if processed > 0 { log.stage()? } else { None };
    let staged_wv = if changed { Some(wv_file.stage(&worldview)?) } else { None };
    if let Some(staged) = staged_wv {
        staged.commit()?;
    }
    if let Some(staged) = staged_items {
        staged.commit()?;
    }
    if changed {
        StateHistory::new(&paths.history).append(&worldview, now)?;
    }

    counter!("synthesis_cycles_total").increment(1);
    counter!("synthesis_items_processed_total").increment(processed as u64);
    counter!("synthesis_theses_created_total").increment(stats.theses_created as u64);
    if changed {
        counter!("synthesis_worldview_changes_total").increment(1);
    }
    gauge!("synthesis_worldview_version").set(worldview.version as f64);

    let active_theses = worldview.active_theses.iter().filter(|t| t.is_active()).count();
    if changed {
        tracing::info!(
            target: "synthesis",
            processed,
            state_id = %worldview.state_id,
            version = worldview.version,
            sectors = stats.sectors_updated.len(),
            theses_created = stats.theses_created,
            theses_updated = stats.theses_updated,
            "worldview updated"
        );
    } else {
        tracing::info!(target: "synthesis", processed, "worldview unchanged");
    }

    Ok(CycleReport {
        processed,
        changed,
        state_id: worldview.state_id,
        version: worldview.version,
        active_theses,
        stats,
    })
}
