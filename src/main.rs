//! Worldview synthesis: binary entrypoint.
//! Runs one synthesis cycle over the item log, then (unless `--no-execute`)
//! one trade-signal pass over the resulting worldview.
//!
//! `--seed` writes a fresh worldview when none exists yet.

use anyhow::{Context, Result};
use chrono::Utc;

use worldview_synthesis::execution::run_execution;
use worldview_synthesis::store::worldview::WorldviewFile;
use worldview_synthesis::telemetry::init_tracing;
use worldview_synthesis::{run_synthesis, Lexicon, SynthesisConfig, Worldview};

fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let execute = !args.iter().any(|a| a == "--no-execute");
    let seed = args.iter().any(|a| a == "--seed");

    let cfg = SynthesisConfig::load_default().context("loading synthesis config")?;
    let lexicon = Lexicon::load_default().context("loading lexicon")?;
    let paths = cfg.paths();
    let now = Utc::now();

    if seed {
        let file = WorldviewFile::new(&paths.worldview);
        if file.load()?.is_none() {
            file.save(&Worldview::seed(now))?;
            tracing::info!(target: "synthesis", path = %paths.worldview.display(), "seeded worldview");
        }
    }

    let report = run_synthesis(&paths, &lexicon, now).context("synthesis cycle failed")?;
    tracing::info!(
        target: "synthesis",
        processed = report.processed,
        changed = report.changed,
        state_id = %report.state_id,
        version = report.version,
        active_theses = report.active_theses,
        "cycle complete"
    );

    if execute {
        let exec = run_execution(&paths, cfg.initial_capital_usd, Utc::now())
            .context("execution pass failed")?;
        tracing::info!(
            target: "execution",
            signals = exec.signals,
            trades = exec.trades,
            drawdown_pct = exec.drawdown_pct,
            "execution complete"
        );
    }

    Ok(())
}
