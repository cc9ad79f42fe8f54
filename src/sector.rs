//! Sector taxonomy and the multi-label ticker classifier.

use serde::{Deserialize, Serialize};

use crate::lexicon::Lexicon;

/// Closed set of sectors tracked by the worldview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    SocialMedia,
    CryptoAi,
    Defi,
    TradEquities,
    Options,
}

impl Sector {
    pub const ALL: [Sector; 5] = [
        Sector::SocialMedia,
        Sector::CryptoAi,
        Sector::Defi,
        Sector::TradEquities,
        Sector::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::SocialMedia => "social_media",
            Sector::CryptoAi => "crypto_ai",
            Sector::Defi => "defi",
            Sector::TradEquities => "trad_equities",
            Sector::Options => "options",
        }
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sectors a ticker counts toward. Not mutually exclusive: anything outside
/// the crypto whitelist also counts toward `trad_equities`, even when it is
/// already tagged DeFi or social. `options` is never produced here.
pub fn classify(lexicon: &Lexicon, ticker: &str) -> Vec<Sector> {
    let t = ticker.trim().to_ascii_uppercase();
    let crypto = lexicon.is_crypto(&t);

    let mut out = Vec::with_capacity(2);
    if crypto {
        out.push(Sector::CryptoAi);
    }
    if lexicon.is_defi(&t) {
        out.push(Sector::Defi);
    }
    if lexicon.is_social(&t) {
        out.push(Sector::SocialMedia);
    }
    if !crypto {
        out.push(Sector::TradEquities);
    }
    out
}
