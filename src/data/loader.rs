// ============================================================
// Layer 4 — Post Loader
// ============================================================
// Loads labelled posts from a JSON Lines file:
//
//   {"text": "Flood warning issued for coastal areas", "label": 1}
//   {"text": "Beautiful sunset over the ocean today",  "label": 0}
//
// One object per line, blank lines ignored. `target` is accepted
// in place of `label`. A malformed line aborts the load with the
// offending line number instead of being silently skipped, since
// a dropped row would shift the train/validation split.
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::domain::error::PipelineError;
use crate::domain::post::LabeledPost;
use crate::domain::traits::PostSource;

/// Loads labelled posts from a `.jsonl` file.
pub struct JsonlPostLoader {
    path: PathBuf,
}

impl JsonlPostLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PostSource for JsonlPostLoader {
    fn load_all(&self) -> Result<Vec<LabeledPost>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open training data '{}'", self.path.display()))?;

        let mut posts = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line
                .with_context(|| format!("Cannot read '{}'", self.path.display()))?;
            if line.trim().is_empty() {
                continue;
            }

            let post: LabeledPost = serde_json::from_str(&line).map_err(|e| {
                PipelineError::Validation(format!(
                    "{}:{}: {e}",
                    self.path.display(),
                    i + 1
                ))
            })?;
            posts.push(post);
        }

        tracing::info!(
            "Loaded {} posts from '{}'",
            posts.len(),
            self.path.display()
        );
        Ok(posts)
    }
}
