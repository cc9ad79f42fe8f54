//! Error taxonomy for a synthesis cycle.
//!
//! Malformed items are never errors (the extractor degrades them to a
//! neutral signal). What remains is the fatal missing-worldview precondition
//! and persistence failures, which abort the cycle without committing.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthesisError {
    /// No seed worldview exists; synthesis cannot start without one.
    #[error("no live worldview at {}", path.display())]
    MissingWorldview { path: PathBuf },

    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in {} (line {line}): {source}", path.display())]
    Decode {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl SynthesisError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// True for the persistence side of the taxonomy (anything but a missing worldview).
    pub fn is_persistence(&self) -> bool {
        !matches!(self, Self::MissingWorldview { .. })
    }
}

pub type Result<T> = std::result::Result<T, SynthesisError>;
