//! Item log: the JSONL record of every ingested item.
//!
//! Held in memory with an id → positions index, so annotation is an in-place
//! update rather than a rescan. The on-disk log is rewritten on flush through
//! a staged file. Annotation happens at most once per record.
//!
//! Older logs may hold several records under one id. They are all kept on
//! rewrite and annotated together; readers see the id once.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SynthesisError};
use crate::extract::ExtractedSignal;
use crate::ingest::types::RawItem;
use crate::store::StagedFile;

#[derive(Debug, Default)]
pub struct ItemLog {
    path: Option<PathBuf>,
    items: Vec<RawItem>,
    index: HashMap<String, Vec<usize>>,
}

impl ItemLog {
    /// A log with no backing file; `stage()` yields nothing.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the log at `path`. A missing file is an empty log; blank lines
    /// are skipped; records sharing an id are all retained.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut log = Self {
            path: Some(path.clone()),
            ..Self::default()
        };
        if !path.exists() {
            return Ok(log);
        }

        let content =
            fs::read_to_string(&path).map_err(|e| SynthesisError::io("read item log", &path, e))?;
        for (n, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let item: RawItem = serde_json::from_str(line).map_err(|e| SynthesisError::Decode {
                path: path.clone(),
                line: n + 1,
                source: e,
            })?;
            if log.index.contains_key(&item.id) {
                tracing::warn!(target: "item_log", id = %item.id, line = n + 1, "duplicate item id kept");
            }
            log.push(item);
        }
        Ok(log)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn push(&mut self, item: RawItem) {
        self.index
            .entry(item.id.clone())
            .or_default()
            .push(self.items.len());
        self.items.push(item);
    }

    /// Append unless the id is already present.
    pub fn append(&mut self, item: RawItem) -> bool {
        if self.index.contains_key(&item.id) {
            return false;
        }
        self.push(item);
        true
    }

    /// First record logged under `id`.
    pub fn get(&self, id: &str) -> Option<&RawItem> {
        self.index
            .get(id)
            .and_then(|pos| pos.first())
            .map(|&i| &self.items[i])
    }

    /// Items without a signal, in ingestion order, one per id.
    pub fn unprocessed(&self) -> Vec<RawItem> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .filter(|it| !it.is_processed() && seen.insert(it.id.clone()))
            .cloned()
            .collect()
    }

    /// Attach `signal` and stamp `processed_at` on every unprocessed record
    /// with this id. Returns `false` for unknown ids and when all of them
    /// already carry a signal.
    pub fn annotate(&mut self, id: &str, signal: ExtractedSignal, at: DateTime<Utc>) -> bool {
        let Some(positions) = self.index.get(id) else {
            return false;
        };
        let mut annotated = false;
        for &i in positions {
            let item = &mut self.items[i];
            if item.is_processed() {
                continue;
            }
            item.extracted_signal = Some(signal.clone());
            item.processed_at = Some(at);
            annotated = true;
        }
        annotated
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawItem> {
        self.items.iter()
    }

    /// Record count, duplicates included.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Serialize the whole log as JSONL.
    pub fn to_jsonl(&self) -> Result<String> {
        let mut out = String::new();
        for it in &self.items {
            let line = serde_json::to_string(it).map_err(|e| SynthesisError::Encode {
                what: "item",
                source: e,
            })?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }

    /// Write the log to its temp file; `None` for in-memory logs.
    pub fn stage(&self) -> Result<Option<StagedFile>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let body = self.to_jsonl()?;
        StagedFile::write(path, body.as_bytes()).map(Some)
    }

    pub fn flush(&self) -> Result<()> {
        if let Some(staged) = self.stage()? {
            staged.commit()?;
        }
        Ok(())
    }
}
