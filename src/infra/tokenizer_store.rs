// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Persists the fitted vocabulary as a small JSON document:
//
//   {
//     "max_words": 10000,
//     "max_sequence_length": 50,
//     "oov_token": "<OOV>",
//     "oov_id": 1,
//     "words": ["fire", "flood", ...]   // index i has ID i + 2
//   }
//
// The same vocabulary must be used for training and inference,
// so loading checks the stored limits against the pipeline's
// and rejects anything it could not have written itself.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::tokenizer::{validate_limits, Vocabulary, VocabularyTokenizer, OOV_ID, OOV_TOKEN};
use crate::domain::error::{PersistenceError, PipelineError};
use crate::infra::staged_file::StagedFile;

#[derive(Debug, Serialize, Deserialize)]
struct TokenizerFile {
    max_words: usize,
    max_sequence_length: usize,
    oov_token: String,
    oov_id: u32,
    words: Vec<String>,
}

pub struct TokenizerStore {
    path: PathBuf,
}

impl TokenizerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encode a fitted tokenizer into a staged file. Unfitted
    /// tokenizers have nothing to save.
    pub fn stage(&self, tokenizer: &VocabularyTokenizer) -> Result<StagedFile, PipelineError> {
        let vocabulary = tokenizer.vocabulary().ok_or(PipelineError::NotFitted)?;
        let file = TokenizerFile {
            max_words: tokenizer.max_words(),
            max_sequence_length: tokenizer.max_sequence_length(),
            oov_token: OOV_TOKEN.to_string(),
            oov_id: OOV_ID,
            words: vocabulary.words().to_vec(),
        };

        let json = serde_json::to_vec_pretty(&file).map_err(|e| PersistenceError::Io {
            path: self.path.clone(),
            source: e.into(),
        })?;
        let staged = StagedFile::write(&self.path, &json)?;

        tracing::debug!(
            "Staged tokenizer ({} words) for '{}'",
            vocabulary.len(),
            self.path.display()
        );
        Ok(staged)
    }

    /// Load a tokenizer fitted for exactly these limits.
    pub fn load(
        &self,
        max_words: usize,
        max_sequence_length: usize,
    ) -> Result<VocabularyTokenizer, PipelineError> {
        validate_limits(max_words, max_sequence_length)?;

        let json = fs::read(&self.path).map_err(|e| PersistenceError::from_io(&self.path, e))?;
        let file: TokenizerFile = serde_json::from_slice(&json).map_err(|e| self.corrupt(e.to_string()))?;

        if file.oov_id != OOV_ID || file.oov_token != OOV_TOKEN {
            return Err(self.incompatible(format!(
                "unsupported OOV sentinel {:?}={}",
                file.oov_token, file.oov_id
            )).into());
        }
        if file.max_words != max_words || file.max_sequence_length != max_sequence_length {
            return Err(self.incompatible(format!(
                "tokenizer was fitted for max_words={} max_sequence_length={}, pipeline expects {} and {}",
                file.max_words, file.max_sequence_length, max_words, max_sequence_length
            )).into());
        }

        let tokenizer = VocabularyTokenizer::new(max_words, max_sequence_length);
        if file.words.len() > tokenizer.capacity() {
            return Err(self.corrupt(format!(
                "{} words exceed the capacity of {}",
                file.words.len(),
                tokenizer.capacity()
            )).into());
        }

        let mut seen = HashSet::with_capacity(file.words.len());
        for word in &file.words {
            if word.is_empty() || word.contains(' ') {
                return Err(self.corrupt(format!("invalid vocabulary entry {word:?}")).into());
            }
            if !seen.insert(word.as_str()) {
                return Err(self.corrupt(format!("duplicate vocabulary entry {word:?}")).into());
            }
        }

        tracing::info!(
            "Loaded tokenizer ({} words) from '{}'",
            file.words.len(),
            self.path.display()
        );
        Ok(VocabularyTokenizer::with_vocabulary(
            max_words,
            max_sequence_length,
            Vocabulary::from_words(file.words),
        ))
    }

    fn corrupt(&self, reason: String) -> PersistenceError {
        PersistenceError::Corrupt { path: self.path.clone(), reason }
    }

    fn incompatible(&self, reason: String) -> PersistenceError {
        PersistenceError::Incompatible { path: self.path.clone(), reason }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> VocabularyTokenizer {
        let mut tok = VocabularyTokenizer::new(100, 6);
        tok.fit(&["Forest fire near the town", "fire crews on scene"]);
        tok
    }

    #[test]
    fn test_round_trip_encodes_identically() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().join("tokenizer.json"));
        let tok = fitted();
        store.stage(&tok).unwrap().commit().unwrap();

        let loaded = store.load(100, 6).unwrap();
        let texts = ["fire near the scene", "unseen words here", ""];
        assert_eq!(loaded.encode(&texts).unwrap(), tok.encode(&texts).unwrap());
        assert_eq!(loaded.vocabulary(), tok.vocabulary());
    }

    #[test]
    fn test_saving_unfitted_tokenizer_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().join("tokenizer.json"));
        let err = store.stage(&VocabularyTokenizer::new(100, 6)).unwrap_err();
        assert!(matches!(err, PipelineError::NotFitted));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_limits_must_match() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().join("tokenizer.json"));
        store.stage(&fitted()).unwrap().commit().unwrap();

        assert!(matches!(store.load(200, 6), Err(PipelineError::Persistence(PersistenceError::Incompatible { .. }))));
        assert!(matches!(store.load(100, 7), Err(PipelineError::Persistence(PersistenceError::Incompatible { .. }))));
    }

    #[test]
    fn test_rejects_duplicates_and_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        let store = TokenizerStore::new(&path);

        fs::write(
            &path,
            r#"{"max_words":10,"max_sequence_length":4,"oov_token":"<OOV>","oov_id":1,"words":["fire","fire"]}"#,
        )
        .unwrap();
        assert!(matches!(store.load(10, 4), Err(PipelineError::Persistence(PersistenceError::Corrupt { .. }))));

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(store.load(10, 4), Err(PipelineError::Persistence(PersistenceError::Corrupt { .. }))));
    }

    #[test]
    fn test_unusable_limits_are_rejected_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().join("tokenizer.json"));
        store.stage(&fitted()).unwrap().commit().unwrap();

        assert!(matches!(store.load(1, 6), Err(PipelineError::Validation(_))));
        assert!(matches!(store.load(100, 0), Err(PipelineError::Validation(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().join("nope.json"));
        assert!(matches!(store.load(10, 4), Err(PipelineError::Persistence(PersistenceError::Missing(_)))));
    }
}
