//! Flat-file persistence: JSON snapshot, JSONL logs, and staged writes.
//!
//! Every rewrite goes through a `StagedFile`: bytes land in `<target>.tmp`
//! first and only `commit()` renames them over the live file. A staged file
//! dropped without commit removes its temp file, leaving the live one intact.

pub mod history;
pub mod items;
pub mod worldview;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, SynthesisError};

#[derive(Debug)]
pub struct StagedFile {
    tmp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub fn write(target: &Path, bytes: &[u8]) -> Result<Self> {
        if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| SynthesisError::io("create directory", dir, e))?;
        }
        let tmp = tmp_path(target);
        let staged = Self {
            tmp,
            target: target.to_path_buf(),
            committed: false,
        };
        let mut f = fs::File::create(&staged.tmp)
            .map_err(|e| SynthesisError::io("stage", &staged.tmp, e))?;
        f.write_all(bytes)
            .and_then(|_| f.sync_all())
            .map_err(|e| SynthesisError::io("stage", &staged.tmp, e))?;
        Ok(staged)
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Rename the staged bytes over the target.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.tmp, &self.target)
            .map_err(|e| SynthesisError::io("commit", &self.target, e))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

fn tmp_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}
