// ============================================================
// Layer 2 — AnalyzeUseCase
// ============================================================
// Turns a list of texts into the full analysis shown to users:
//
//   predictions          binary label per text
//   probabilities        disaster probability per text
//   is_disaster_related  the labels again, kept for clients that
//                        read this field
//   keywords             up to 5 keywords per text
//
// Both the `predict` command and the HTTP server go through
// `analyze`, so they always report the same thing.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::pipeline::DisasterPipeline;
use crate::data::keywords::{extract_keywords, DEFAULT_KEYWORD_LIMIT};
use crate::domain::error::PipelineError;
use crate::domain::traits::TextClassifier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub predictions: Vec<u8>,
    pub probabilities: Vec<f32>,
    pub is_disaster_related: Vec<u8>,
    pub keywords: Vec<Vec<String>>,
}

/// Classify `texts` and attach keywords. Output order matches input order.
pub fn analyze<C: TextClassifier + ?Sized>(
    classifier: &C,
    texts: &[String],
    threshold: f32,
) -> Result<Analysis, PipelineError> {
    let batch = classifier.predict(texts, threshold)?;
    let keywords = texts
        .iter()
        .map(|t| extract_keywords(t, DEFAULT_KEYWORD_LIMIT))
        .collect();

    Ok(Analysis {
        is_disaster_related: batch.is_disaster_related(),
        predictions: batch.predictions,
        probabilities: batch.probabilities,
        keywords,
    })
}

// ─── AnalyzeUseCase ───────────────────────────────────────────────────────────
/// Loads a saved artifact pair once and analyses texts with it.
pub struct AnalyzeUseCase {
    pipeline: DisasterPipeline,
}

impl AnalyzeUseCase {
    pub fn new(
        model_path: &Path,
        tokenizer_path: &Path,
        max_words: usize,
        max_seq_len: usize,
    ) -> Result<Self> {
        let pipeline =
            DisasterPipeline::from_artifacts(max_words, max_seq_len, model_path, tokenizer_path)
                .with_context(|| {
                    format!(
                        "Cannot load model '{}' with tokenizer '{}'. Have you run 'train' first?",
                        model_path.display(),
                        tokenizer_path.display()
                    )
                })?;
        Ok(Self { pipeline })
    }

    pub fn analyze(&self, texts: &[String], threshold: f32) -> Result<Analysis> {
        Ok(analyze(&self.pipeline, texts, threshold)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::PredictionBatch;

    /// Scores a text by whether it mentions "flood".
    struct FloodDetector;

    impl TextClassifier for FloodDetector {
        fn is_fitted(&self) -> bool {
            true
        }

        fn predict(&self, texts: &[String], threshold: f32) -> Result<PredictionBatch, PipelineError> {
            let probabilities = texts
                .iter()
                .map(|t| if t.to_lowercase().contains("flood") { 0.9 } else { 0.1 })
                .collect();
            Ok(PredictionBatch::from_probabilities(probabilities, threshold))
        }
    }

    #[test]
    fn test_analysis_is_aligned_with_input() {
        let texts = vec!["Flood warning issued".to_string(), "Nice day at the beach".to_string()];
        let analysis = analyze(&FloodDetector, &texts, 0.5).unwrap();

        assert_eq!(analysis.predictions, vec![1, 0]);
        assert_eq!(analysis.is_disaster_related, analysis.predictions);
        assert_eq!(analysis.keywords[0], vec!["flood", "warning", "issued"]);
        assert_eq!(analysis.keywords[1], vec!["nice", "beach"]);
    }

    #[test]
    fn test_missing_artifacts_fail_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = AnalyzeUseCase::new(
            &dir.path().join("model.bin"),
            &dir.path().join("tokenizer.json"),
            100,
            10,
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("Have you run 'train' first?"));
    }
}
