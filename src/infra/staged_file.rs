// ============================================================
// Layer 6 — Staged Artifact Writes
// ============================================================
// An artifact is first written in full to a sibling `.tmp` file
// and only renamed over the real path on `commit`. Staging both
// halves of the model/tokenizer pair before committing either
// means a failed encode or write leaves the previous pair intact.
// A staged file that is dropped without being committed is
// deleted.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::error::PersistenceError;

#[derive(Debug)]
pub struct StagedFile {
    tmp: Option<PathBuf>,
    path: PathBuf,
}

impl StagedFile {
    /// Write `bytes` next to `path`. Parent directories are created.
    pub fn write(path: &Path, bytes: &[u8]) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PersistenceError::from_io(parent, e))?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, bytes).map_err(|e| PersistenceError::from_io(&tmp, e))?;
        Ok(Self {
            tmp: Some(tmp),
            path: path.to_path_buf(),
        })
    }

    /// Move the staged bytes into place.
    pub fn commit(mut self) -> Result<(), PersistenceError> {
        if let Some(tmp) = self.tmp.take() {
            if let Err(e) = fs::rename(&tmp, &self.path) {
                let _ = fs::remove_file(&tmp);
                return Err(PersistenceError::from_io(&self.path, e));
            }
        }
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Some(tmp) = self.tmp.take() {
            let _ = fs::remove_file(tmp);
        }
    }
}
