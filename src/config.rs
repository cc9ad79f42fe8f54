// src/config.rs
//! Where the engine keeps its state, and the knobs that are not part of the
//! lexicon. TOML, resolved from env var → `config/synthesis.toml` → defaults.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "SYNTHESIS_CONFIG_PATH";
pub const ENV_DATA_DIR: &str = "SYNTHESIS_DATA_DIR";
pub const DEFAULT_CONFIG_PATH: &str = "config/synthesis.toml";

/// Seed value of a fresh paper portfolio.
pub const DEFAULT_INITIAL_CAPITAL_USD: f64 = 2084.58;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub initial_capital_usd: f64,
    pub files: FileNames,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileNames {
    pub worldview: String,
    pub items: String,
    pub source_weights: String,
    pub history: String,
    pub portfolio: String,
    pub trades: String,
    pub pending_signals: String,
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            worldview: "worldview.json".into(),
            items: "alpha.jsonl".into(),
            source_weights: "source_weights.json".into(),
            history: "state_history.jsonl".into(),
            portfolio: "portfolio.json".into(),
            trades: "trades.jsonl".into(),
            pending_signals: "pending_signals.json".into(),
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            logs_dir: PathBuf::from("logs"),
            initial_capital_usd: DEFAULT_INITIAL_CAPITAL_USD,
            files: FileNames::default(),
        }
    }
}

/// Concrete file locations for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub worldview: PathBuf,
    pub items: PathBuf,
    pub source_weights: PathBuf,
    pub history: PathBuf,
    pub portfolio: PathBuf,
    pub trades: PathBuf,
    pub pending_signals: PathBuf,
}

impl DataPaths {
    /// Default file names under `data_dir`, history under `logs_dir`.
    pub fn under(data_dir: &Path, logs_dir: &Path) -> Self {
        Self::with_names(data_dir, logs_dir, &FileNames::default())
    }

    fn with_names(data: &Path, logs: &Path, n: &FileNames) -> Self {
        Self {
            worldview: data.join(&n.worldview),
            items: data.join(&n.items),
            source_weights: data.join(&n.source_weights),
            history: logs.join(&n.history),
            portfolio: data.join(&n.portfolio),
            trades: data.join(&n.trades),
            pending_signals: data.join(&n.pending_signals),
        }
    }
}

impl SynthesisConfig {
    pub fn paths(&self) -> DataPaths {
        DataPaths::with_names(&self.data_dir, &self.logs_dir, &self.files)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).context("parsing synthesis config")?;
        if !(cfg.initial_capital_usd.is_finite() && cfg.initial_capital_usd > 0.0) {
            return Err(anyhow!("initial_capital_usd must be a positive number"));
        }
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading synthesis config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("in {}", path.display()))
    }

    /// 1) $SYNTHESIS_CONFIG_PATH (must exist)
    /// 2) config/synthesis.toml
    /// 3) built-in defaults
    ///
    /// $SYNTHESIS_DATA_DIR then overrides `data_dir`.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Self::load_from(&default)?
            } else {
                Self::default()
            }
        };

        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            if !dir.trim().is_empty() {
                cfg.data_dir = PathBuf::from(dir);
            }
        }
        Ok(cfg)
    }
}
