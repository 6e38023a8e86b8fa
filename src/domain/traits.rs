// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types,
// the application and HTTP layers stay independent of where
// posts come from and how predictions are computed:
//   - JsonlPostLoader implements PostSource
//   - DisasterPipeline implements TextClassifier
//   - tests implement TextClassifier with fixed outputs
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::error::PipelineError;
use crate::domain::post::LabeledPost;
use crate::domain::prediction::PredictionBatch;

// ─── PostSource ───────────────────────────────────────────────────────────────
/// Any component that can load labelled posts for training.
pub trait PostSource {
    /// Load all available posts from this source, in source order.
    fn load_all(&self) -> Result<Vec<LabeledPost>>;
}

// ─── TextClassifier ───────────────────────────────────────────────────────────
/// Any component that can score texts as disaster-related.
pub trait TextClassifier {
    /// True once a vocabulary and model parameters are available.
    fn is_fitted(&self) -> bool;

    /// Score every text and threshold the scores.
    /// Fails with `PipelineError::NotFitted` when `is_fitted()` is false.
    fn predict(&self, texts: &[String], threshold: f32) -> Result<PredictionBatch, PipelineError>;
}
