//! The live worldview snapshot: one pretty-printed JSON object, replaced whole.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SynthesisError};
use crate::store::StagedFile;
use crate::worldview::Worldview;

#[derive(Debug, Clone)]
pub struct WorldviewFile {
    path: PathBuf,
}

impl WorldviewFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no snapshot exists yet. Missing sectors are filled in.
    pub fn load(&self) -> Result<Option<Worldview>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| SynthesisError::io("read worldview", &self.path, e))?;
        let mut wv: Worldview = serde_json::from_str(&raw).map_err(|e| SynthesisError::Decode {
            path: self.path.clone(),
            line: e.line(),
            source: e,
        })?;
        wv.ensure_sectors();
        Ok(Some(wv))
    }

    /// Like `load`, but a missing snapshot is the fatal precondition error.
    pub fn load_required(&self) -> Result<Worldview> {
        self.load()?.ok_or_else(|| SynthesisError::MissingWorldview {
            path: self.path.clone(),
        })
    }

    pub fn stage(&self, wv: &Worldview) -> Result<StagedFile> {
        let mut body = serde_json::to_string_pretty(wv).map_err(|e| SynthesisError::Encode {
            what: "worldview",
            source: e,
        })?;
        body.push('\n');
        StagedFile::write(&self.path, body.as_bytes())
    }

    pub fn save(&self, wv: &Worldview) -> Result<()> {
        self.stage(wv)?.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = WorldviewFile::new(dir.path().join("worldview.json"));
        assert!(file.load().unwrap().is_none());
        assert!(matches!(
            file.load_required(),
            Err(SynthesisError::MissingWorldview { .. })
        ));

        let wv = Worldview::seed(Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap());
        file.save(&wv).unwrap();
        assert_eq!(file.load_required().unwrap(), wv);
    }

    #[test]
    fn garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worldview.json");
        fs::write(&path, "{ nope").unwrap();
        let err = WorldviewFile::new(&path).load().unwrap_err();
        assert!(matches!(err, SynthesisError::Decode { .. }));
        assert!(err.is_persistence());
    }
}
