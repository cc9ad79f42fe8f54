//! State history: append-only JSONL, one full snapshot per worldview version.
//! Entries are never rewritten or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SynthesisError};
use crate::worldview::Worldview;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub state_id: String,
    pub timestamp: DateTime<Utc>,
    pub snapshot: Worldview,
}

#[derive(Debug, Clone)]
pub struct StateHistory {
    path: PathBuf,
}

impl StateHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line for `wv`, recorded at `at`.
    pub fn append(&self, wv: &Worldview, at: DateTime<Utc>) -> Result<()> {
        let entry = HistoryEntry {
            state_id: wv.state_id.clone(),
            timestamp: at,
            snapshot: wv.clone(),
        };
        let line = serde_json::to_string(&entry).map_err(|e| SynthesisError::Encode {
            what: "history entry",
            source: e,
        })?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| SynthesisError::io("create directory", dir, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SynthesisError::io("open history", &self.path, e))?;
        let mut w = BufWriter::new(file);
        writeln!(w, "{line}")
            .and_then(|_| w.flush())
            .map_err(|e| SynthesisError::io("append history", &self.path, e))
    }

    pub fn read_all(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| SynthesisError::io("read history", &self.path, e))?;
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

    /// The newest `n` entries, oldest first.
    pub fn last_n(&self, n: usize) -> Result<Vec<HistoryEntry>> {
        let mut all = self.read_all()?;
        let start = all.len().saturating_sub(n);
        Ok(all.split_off(start))
    }
}
