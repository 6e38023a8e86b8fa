// ============================================================
// Layer 4 — Vocabulary Tokenizer
// ============================================================
// Turns normalised text into fixed-length sequences of word IDs.
//
// ID layout:
//   0              → padding
//   1              → <OOV> (any word not in the vocabulary)
//   2..max_words   → known words, most frequent first
//
// The vocabulary is fitted once from the training corpus and
// capped at `max_words - 2` words. Ties in frequency keep the
// order in which words were first seen, so fitting the same
// corpus always yields the same IDs.
//
// Every encoded sequence has exactly `max_sequence_length`
// entries: shorter inputs are padded with 0 at the end, longer
// ones keep their first `max_sequence_length` word IDs.
//
// Reference: Rust Book §8 (Hash Maps)

use std::collections::HashMap;

use crate::data::normalizer::normalize;
use crate::domain::error::PipelineError;

pub const PAD_ID: u32 = 0;
pub const OOV_ID: u32 = 1;
pub const OOV_TOKEN: &str = "<OOV>";

/// ID given to the most frequent word.
pub const FIRST_WORD_ID: u32 = 2;

/// One integer ID sequence of length `max_sequence_length`.
pub type EncodedSequence = Vec<u32>;

/// Smallest usable `max_words`: the padding and OOV ids need rows in
/// the embedding table even when no real word fits.
pub const MIN_MAX_WORDS: usize = FIRST_WORD_ID as usize;

/// Reject tokenizer limits no model can be built for.
pub fn validate_limits(max_words: usize, max_sequence_length: usize) -> Result<(), PipelineError> {
    if max_words < MIN_MAX_WORDS {
        return Err(PipelineError::Validation(format!(
            "max_words must be at least {MIN_MAX_WORDS} (padding and OOV ids), got {max_words}"
        )));
    }
    if max_sequence_length == 0 {
        return Err(PipelineError::Validation(
            "max_sequence_length must be positive".to_string(),
        ));
    }
    Ok(())
}

// ─── Vocabulary ───────────────────────────────────────────────────────────────
/// Immutable word → ID mapping. The word at position `i` has ID `i + 2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    words: Vec<String>,
    index: HashMap<String, u32>,
}

impl Vocabulary {
    /// Build a vocabulary from words already in ID order.
    pub fn from_words(words: Vec<String>) -> Self {
        let index = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u32 + FIRST_WORD_ID))
            .collect();
        Self { words, index }
    }

    /// ID for `word`, or `OOV_ID` when the word was never fitted.
    pub fn id_of(&self, word: &str) -> u32 {
        self.index.get(word).copied().unwrap_or(OOV_ID)
    }

    /// Words in ID order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

// ─── VocabularyTokenizer ──────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct VocabularyTokenizer {
    max_words: usize,
    max_sequence_length: usize,
    vocabulary: Option<Vocabulary>,
}

impl VocabularyTokenizer {
    /// Create an unfitted tokenizer.
    pub fn new(max_words: usize, max_sequence_length: usize) -> Self {
        Self {
            max_words,
            max_sequence_length,
            vocabulary: None,
        }
    }

    /// Create a tokenizer around a vocabulary restored from disk.
    pub fn with_vocabulary(
        max_words: usize,
        max_sequence_length: usize,
        vocabulary: Vocabulary,
    ) -> Self {
        Self {
            max_words,
            max_sequence_length,
            vocabulary: Some(vocabulary),
        }
    }

    /// Number of real words the vocabulary can hold.
    pub fn capacity(&self) -> usize {
        self.max_words.saturating_sub(FIRST_WORD_ID as usize)
    }

    /// Fit the vocabulary on a corpus, replacing any previous one.
    pub fn fit<S: AsRef<str>>(&mut self, corpus: &[S]) {
        // word → (count, first-seen position)
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut seen = 0usize;

        for text in corpus {
            for word in normalize(text.as_ref()).split(' ').filter(|w| !w.is_empty()) {
                let entry = counts.entry(word.to_string()).or_insert_with(|| {
                    seen += 1;
                    (0, seen)
                });
                entry.0 += 1;
            }
        }

        let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));
        ranked.truncate(self.capacity());

        let vocabulary = Vocabulary::from_words(ranked.into_iter().map(|(w, _)| w).collect());
        tracing::info!(
            "Vocabulary fitted: {} words (cap {})",
            vocabulary.len(),
            self.capacity()
        );
        self.vocabulary = Some(vocabulary);
    }

    /// Encode a batch of texts. Output order matches input order.
    pub fn encode<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<EncodedSequence>, PipelineError> {
        let vocabulary = self.vocabulary.as_ref().ok_or(PipelineError::NotFitted)?;
        Ok(texts
            .iter()
            .map(|t| self.encode_with(vocabulary, t.as_ref()))
            .collect())
    }

    fn encode_with(&self, vocabulary: &Vocabulary, text: &str) -> EncodedSequence {
        let mut ids: Vec<u32> = normalize(text)
            .split(' ')
            .filter(|w| !w.is_empty())
            .take(self.max_sequence_length)
            .map(|w| vocabulary.id_of(w))
            .collect();
        ids.resize(self.max_sequence_length, PAD_ID);
        ids
    }

    pub fn is_fitted(&self) -> bool {
        self.vocabulary.is_some()
    }

    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.vocabulary.as_ref()
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    pub fn max_sequence_length(&self) -> usize {
        self.max_sequence_length
    }
}
