//! Lexicon: the immutable configuration data behind signal extraction.
//!
//! - Bullish / bearish keyword sets (lower-case, matched by substring).
//! - Ordered asset patterns; scan order decides the primary asset.
//! - Sector whitelists used by the classifier.
//!
//! The built-in lexicon is `config/lexicon.toml`, embedded at compile time.
//! A different file can be loaded via `$LEXICON_PATH` or `config/lexicon.toml`
//! in the working directory.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_LEXICON_PATH: &str = "LEXICON_PATH";
pub const DEFAULT_LEXICON_PATH: &str = "config/lexicon.toml";

static BUILTIN: Lazy<Lexicon> = Lazy::new(|| {
    let raw = include_str!("../config/lexicon.toml");
    Lexicon::from_toml_str(raw).expect("valid built-in lexicon")
});

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct LexiconConfig {
    #[serde(default)]
    pub bullish: Vec<String>,
    #[serde(default)]
    pub bearish: Vec<String>,
    #[serde(default)]
    pub assets: Vec<AssetPatternCfg>,
    #[serde(default)]
    pub sectors: SectorListsCfg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetPatternCfg {
    pub id: String,
    /// Regex; the first capture group (or the whole match) is the ticker.
    pub pattern: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectorListsCfg {
    #[serde(default)]
    pub crypto: Vec<String>,
    #[serde(default)]
    pub defi: Vec<String>,
    #[serde(default)]
    pub social: Vec<String>,
}

/* ----------------------------
Compiled lexicon
---------------------------- */

#[derive(Debug, Clone)]
struct AssetPattern {
    id: String,
    re: Regex,
}

#[derive(Debug, Clone)]
pub struct Lexicon {
    bullish: Vec<String>,
    bearish: Vec<String>,
    patterns: Vec<AssetPattern>,
    crypto: HashSet<String>,
    defi: HashSet<String>,
    social: HashSet<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Lexicon {
    /// The lexicon shipped with the crate.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: LexiconConfig = toml::from_str(s).context("parsing lexicon toml")?;
        Self::compile(cfg)
    }

    pub fn compile(cfg: LexiconConfig) -> Result<Self> {
        let patterns = cfg
            .assets
            .into_iter()
            .map(|a| {
                let re = Regex::new(&a.pattern)
                    .map_err(|e| anyhow!("asset pattern `{}` regex error: {}", a.id, e))?;
                Ok(AssetPattern { id: a.id, re })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            bullish: clean_keywords(cfg.bullish),
            bearish: clean_keywords(cfg.bearish),
            patterns,
            crypto: ticker_set(cfg.sectors.crypto),
            defi: ticker_set(cfg.sectors.defi),
            social: ticker_set(cfg.sectors.social),
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading lexicon from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Resolve the lexicon:
    /// 1) $LEXICON_PATH (must exist)
    /// 2) config/lexicon.toml
    /// 3) built-in
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_LEXICON_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("LEXICON_PATH points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let local = PathBuf::from(DEFAULT_LEXICON_PATH);
        if local.exists() {
            return Self::load_from(&local);
        }
        Ok(Self::builtin())
    }

    /// Count (bullish, bearish) keywords contained in already lower-cased text.
    pub fn keyword_counts(&self, lowered: &str) -> (usize, usize) {
        let count = |set: &[String]| set.iter().filter(|kw| lowered.contains(kw.as_str())).count();
        (count(&self.bullish), count(&self.bearish))
    }

    /// Upper-cased, deduplicated tickers in pattern-scan order.
    pub fn scan_assets(&self, content: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for p in &self.patterns {
            for caps in p.re.captures_iter(content) {
                let Some(m) = caps.get(1).or_else(|| caps.get(0)) else {
                    continue;
                };
                let ticker = m.as_str().to_ascii_uppercase();
                if !out.contains(&ticker) {
                    out.push(ticker);
                }
            }
        }
        out
    }

    pub fn pattern_ids(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.id.as_str())
    }

    pub fn is_crypto(&self, ticker: &str) -> bool {
        self.crypto.contains(ticker)
    }

    pub fn is_defi(&self, ticker: &str) -> bool {
        self.defi.contains(ticker)
    }

    pub fn is_social(&self, ticker: &str) -> bool {
        self.social.contains(ticker)
    }
}

/// Trim, lower-case, drop empties and repeats (first occurrence wins).
fn clean_keywords(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim().to_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

fn ticker_set(items: Vec<String>) -> HashSet<String> {
    items
        .into_iter()
        .map(|t| t.trim().to_ascii_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}
