// ============================================================
// Layer 2 — Disaster Pipeline
// ============================================================
// The one owned object that holds a fitted (vocabulary, model)
// pair. It is created once at process start, trained or loaded,
// and then handed to the CLI or the HTTP server by reference.
//
//   train   normalise → fit vocabulary → encode → split →
//           Adam + early stopping → commit
//   predict encode → forward → threshold
//   save    stage model + tokenizer artifacts, then commit both
//   load    both artifacts, validated against the configured
//           max_words / max_sequence_length
//
// `train` and `load` build every new piece first and only then
// replace the current state, so a failure never leaves a
// half-fitted pipeline behind.
//
// Reference: Rust Book §17 (Encapsulation)

use std::path::Path;

use burn::tensor::backend::Backend;

use crate::data::dataset::{PostDataset, PostSample};
use crate::data::splitter::split_train_val;
use crate::data::tokenizer::VocabularyTokenizer;
use crate::domain::error::PipelineError;
use crate::domain::prediction::PredictionBatch;
use crate::domain::traits::TextClassifier;
use crate::infra::model_store::{transfer, ModelStore};
use crate::infra::tokenizer_store::TokenizerStore;
use crate::ml::inferencer::Inferencer;
use crate::ml::model::{DisasterClassifier, DisasterClassifierConfig};
use crate::ml::trainer::{run_training, TrainingHistory, TrainingOptions};
use crate::ml::{InferBackend, InferDevice, TrainBackend};

pub const DEFAULT_MAX_WORDS: usize = 10_000;
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 50;

pub struct DisasterPipeline {
    model_config: DisasterClassifierConfig,
    tokenizer: VocabularyTokenizer,
    inferencer: Option<Inferencer>,
    device: InferDevice,
}

impl DisasterPipeline {
    /// Unfitted pipeline with the default layer widths.
    pub fn new(max_words: usize, max_sequence_length: usize) -> Result<Self, PipelineError> {
        Self::with_model_config(DisasterClassifierConfig::new(max_words, max_sequence_length))
    }

    /// Unfitted pipeline for a specific architecture. The tokenizer
    /// limits follow the config's `vocab_size` and `max_seq_len`;
    /// `max_words` must leave room for PAD and OOV and sequences
    /// must have at least one slot.
    pub fn with_model_config(model_config: DisasterClassifierConfig) -> Result<Self, PipelineError> {
        model_config.validate()?;
        let tokenizer = VocabularyTokenizer::new(model_config.vocab_size, model_config.max_seq_len);
        Ok(Self {
            model_config,
            tokenizer,
            inferencer: None,
            device: InferDevice::default(),
        })
    }

    /// Build a pipeline straight from a saved artifact pair.
    pub fn from_artifacts(
        max_words: usize,
        max_sequence_length: usize,
        model_path: impl AsRef<Path>,
        tokenizer_path: impl AsRef<Path>,
    ) -> Result<Self, PipelineError> {
        let mut pipeline = Self::new(max_words, max_sequence_length)?;
        pipeline.load(model_path, tokenizer_path)?;
        Ok(pipeline)
    }

    pub fn model_config(&self) -> &DisasterClassifierConfig {
        &self.model_config
    }

    // ─── Training ─────────────────────────────────────────────────────────────
    /// Fit the vocabulary from `texts`, then train the model.
    ///
    /// The vocabulary is rebuilt from scratch on every call. When a
    /// model of the same architecture already exists its weights are
    /// the starting point; otherwise a fresh model is initialised.
    pub fn train<S: AsRef<str>>(
        &mut self,
        texts: &[S],
        labels: &[u8],
        opts: &TrainingOptions,
    ) -> Result<TrainingHistory, PipelineError> {
        self.model_config.validate()?;
        opts.validate()?;
        validate_training_data(texts.len(), labels)?;

        let mut tokenizer = self.tokenizer.clone();
        tokenizer.fit(texts);
        let encoded = tokenizer.encode(texts)?;

        let samples: Vec<PostSample> = encoded
            .into_iter()
            .zip(labels)
            .map(|(input_ids, &label)| PostSample { input_ids, label })
            .collect();
        let (train, val) = split_train_val(samples, opts.validation_split, opts.split);
        if train.is_empty() {
            return Err(PipelineError::Validation(format!(
                "validation_split {} leaves no training samples out of {}",
                opts.validation_split,
                texts.len()
            )));
        }
        tracing::info!("Split {} posts: {} train, {} validation", texts.len(), train.len(), val.len());

        TrainBackend::seed(opts.seed);
        let model = self.starting_model()?;

        let (model, history) = run_training(
            opts,
            model,
            PostDataset::new(train),
            PostDataset::new(val),
            &self.device,
        )?;

        self.tokenizer = tokenizer;
        self.inferencer = Some(Inferencer::new(model, self.model_config.clone(), self.device.clone()));
        Ok(history)
    }

    fn starting_model(&self) -> Result<DisasterClassifier<TrainBackend>, PipelineError> {
        match &self.inferencer {
            Some(existing) if existing.config().same_architecture(&self.model_config) => {
                tracing::info!("Continuing from the current model weights");
                transfer::<InferBackend, TrainBackend>(
                    existing.model().clone(),
                    &self.model_config,
                    &self.device,
                )
            }
            _ => Ok(self.model_config.init::<TrainBackend>(&self.device)),
        }
    }

    // ─── Inference ────────────────────────────────────────────────────────────
    /// Probability and label per text, in input order.
    pub fn predict<S: AsRef<str>>(
        &self,
        texts: &[S],
        threshold: f32,
    ) -> Result<PredictionBatch, PipelineError> {
        let inferencer = self.inferencer.as_ref().ok_or(PipelineError::NotFitted)?;
        if texts.is_empty() {
            return Ok(PredictionBatch::default());
        }

        let encoded = self.tokenizer.encode(texts)?;
        let probabilities = inferencer.probabilities(&encoded)?;
        Ok(PredictionBatch::from_probabilities(probabilities, threshold))
    }

    pub fn is_fitted(&self) -> bool {
        self.inferencer.is_some() && self.tokenizer.is_fitted()
    }

    // ─── Persistence ──────────────────────────────────────────────────────────
    /// Write both artifacts. Each is encoded and written to a temp
    /// file first; neither existing file is replaced unless both
    /// stages succeeded.
    pub fn save(
        &self,
        model_path: impl AsRef<Path>,
        tokenizer_path: impl AsRef<Path>,
    ) -> Result<(), PipelineError> {
        let inferencer = self.inferencer.as_ref().ok_or(PipelineError::NotFitted)?;
        let model = ModelStore::new(model_path.as_ref()).stage(inferencer.model(), inferencer.config())?;
        let tokenizer = TokenizerStore::new(tokenizer_path.as_ref()).stage(&self.tokenizer)?;

        model.commit()?;
        tokenizer.commit()?;
        tracing::info!(
            "Saved model to '{}' and tokenizer to '{}'",
            model_path.as_ref().display(),
            tokenizer_path.as_ref().display()
        );
        Ok(())
    }

    /// Replace the fitted state with a saved artifact pair. On error
    /// the pipeline is left exactly as it was.
    pub fn load(
        &mut self,
        model_path: impl AsRef<Path>,
        tokenizer_path: impl AsRef<Path>,
    ) -> Result<(), PipelineError> {
        let tokenizer = TokenizerStore::new(tokenizer_path.as_ref())
            .load(self.tokenizer.max_words(), self.tokenizer.max_sequence_length())?;
        let (model, config) =
            ModelStore::new(model_path.as_ref()).load::<InferBackend>(&self.model_config, &self.device)?;

        self.tokenizer = tokenizer;
        self.model_config = config.clone();
        self.inferencer = Some(Inferencer::new(model, config, self.device.clone()));
        Ok(())
    }
}

impl TextClassifier for DisasterPipeline {
    fn is_fitted(&self) -> bool {
        DisasterPipeline::is_fitted(self)
    }

    fn predict(&self, texts: &[String], threshold: f32) -> Result<PredictionBatch, PipelineError> {
        DisasterPipeline::predict(self, texts, threshold)
    }
}

fn validate_training_data(text_count: usize, labels: &[u8]) -> Result<(), PipelineError> {
    if text_count == 0 {
        return Err(PipelineError::Validation("no training texts".to_string()));
    }
    if text_count != labels.len() {
        return Err(PipelineError::Validation(format!(
            "{} texts but {} labels",
            text_count,
            labels.len()
        )));
    }
    if let Some(bad) = labels.iter().find(|&&l| l > 1) {
        return Err(PipelineError::Validation(format!("labels must be 0 or 1, got {bad}")));
    }
    Ok(())
}
