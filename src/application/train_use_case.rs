// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a full training run in order:
//
//   Step 1: Load labelled posts        (Layer 4 - data)
//   Step 2: Build the pipeline         (Layer 2 - application)
//   Step 3: Fit vocabulary + train     (Layers 4 and 5)
//   Step 4: Save the artifact pair     (Layer 6 - infra)
//
// Reference: Burn Book §5 (Training)

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::pipeline::{
    DisasterPipeline, DEFAULT_MAX_SEQUENCE_LENGTH, DEFAULT_MAX_WORDS,
};
use crate::data::loader::JsonlPostLoader;
use crate::domain::post::unzip_posts;
use crate::domain::traits::PostSource;
use crate::ml::trainer::{TrainingHistory, TrainingOptions};

// ─── Training Configuration ──────────────────────────────────────────────────
/// Everything one training run needs: where the data comes from,
/// where the artifacts go, the tokenizer limits and the optimiser
/// settings.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub max_words: usize,
    pub max_seq_len: usize,
    pub options: TrainingOptions,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/sample_posts.jsonl"),
            model_path: PathBuf::from("disaster_nlp_model.bin"),
            tokenizer_path: PathBuf::from("tokenizer.json"),
            max_words: DEFAULT_MAX_WORDS,
            max_seq_len: DEFAULT_MAX_SEQUENCE_LENGTH,
            options: TrainingOptions::default(),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingHistory> {
        let cfg = &self.config;
        let mut pipeline = DisasterPipeline::new(cfg.max_words, cfg.max_seq_len)
            .context("Invalid --max-words / --max-seq-len")?;

        // ── Step 1: Load posts ────────────────────────────────────────────────
        let posts = JsonlPostLoader::new(&cfg.data_path).load_all()?;
        anyhow::ensure!(
            !posts.is_empty(),
            "No posts found in '{}'",
            cfg.data_path.display()
        );
        let disasters = posts.iter().filter(|p| p.is_disaster()).count();
        tracing::info!(
            "{} posts ({} disaster-related, {} not)",
            posts.len(),
            disasters,
            posts.len() - disasters
        );
        let (texts, labels) = unzip_posts(&posts);

        // ── Step 2 + 3: Fit and train ─────────────────────────────────────────
        let history = pipeline
            .train(&texts, &labels, &cfg.options)
            .context("Training failed")?;

        if let Some(best) = history.best_epoch {
            tracing::info!("Best validation loss at epoch {}", best);
        }
        if history.stopped_early {
            tracing::info!("Stopped early after {} epochs", history.epochs.len());
        }

        // ── Step 4: Save the artifact pair ────────────────────────────────────
        pipeline
            .save(&cfg.model_path, &cfg.tokenizer_path)
            .with_context(|| {
                format!(
                    "Cannot save artifacts to '{}' and '{}'",
                    cfg.model_path.display(),
                    cfg.tokenizer_path.display()
                )
            })?;

        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::PipelineError;

    #[test]
    fn test_empty_data_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("empty.jsonl");
        std::fs::write(&data_path, "\n\n").unwrap();

        let config = TrainConfig {
            data_path,
            model_path: dir.path().join("model.bin"),
            tokenizer_path: dir.path().join("tokenizer.json"),
            ..Default::default()
        };
        assert!(TrainUseCase::new(config).execute().is_err());
        assert!(!dir.path().join("model.bin").exists());
    }

    #[test]
    fn test_limits_are_checked_before_training() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("posts.jsonl");
        std::fs::write(&data_path, "{\"text\":\"Flood warning\",\"label\":1}\n").unwrap();

        let config = TrainConfig {
            data_path,
            model_path: dir.path().join("model.bin"),
            tokenizer_path: dir.path().join("tokenizer.json"),
            max_words: 1,
            ..Default::default()
        };
        let err = TrainUseCase::new(config).execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Validation(_))
        ));
        assert!(!dir.path().join("model.bin").exists());
    }
}
