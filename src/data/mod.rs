// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw post text to tensor batches:
//
//   .jsonl file
//       │
//       ▼
//   JsonlPostLoader     → reads labelled posts
//       │
//       ▼
//   normalize           → canonical lowercase text
//       │
//       ▼
//   VocabularyTokenizer → fixed-length word ID sequences
//       │
//       ▼
//   split_train_val     → training / validation partition
//       │
//       ▼
//   PostDataset         → implements Burn's Dataset trait
//       │
//       ▼
//   PostBatcher         → stacks samples into tensor batches
//
// keywords sits beside the pipeline: it reuses normalize for
// the HTTP response's keyword lists.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads labelled posts from JSON Lines
pub mod loader;

/// Deterministic text canonicalisation
pub mod normalizer;

/// Capped word-level vocabulary and sequence encoding
pub mod tokenizer;

/// Implements Burn's Dataset trait for encoded posts
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Splits data into train/validation sets
pub mod splitter;

/// Stop-word filtered keyword extraction
pub mod keywords;
