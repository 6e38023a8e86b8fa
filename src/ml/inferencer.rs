// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Runs the trained classifier on the inner (non-autodiff)
// backend. Weights are never mutated here.

use crate::data::batcher::sequences_to_tensor;
use crate::data::tokenizer::EncodedSequence;
use crate::domain::error::PipelineError;
use crate::ml::model::{DisasterClassifier, DisasterClassifierConfig};
use crate::ml::{InferBackend, InferDevice};

pub struct Inferencer {
    model: DisasterClassifier<InferBackend>,
    config: DisasterClassifierConfig,
    device: InferDevice,
}

impl Inferencer {
    pub fn new(
        model: DisasterClassifier<InferBackend>,
        config: DisasterClassifierConfig,
        device: InferDevice,
    ) -> Self {
        Self { model, config, device }
    }

    /// One disaster probability per encoded sequence, in input order.
    pub fn probabilities(&self, sequences: &[EncodedSequence]) -> Result<Vec<f32>, PipelineError> {
        if sequences.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(bad) = sequences.iter().find(|s| s.len() != self.config.max_seq_len) {
            return Err(PipelineError::Inference(format!(
                "sequence length {} does not match model input length {}",
                bad.len(),
                self.config.max_seq_len
            )));
        }

        let input = sequences_to_tensor::<InferBackend>(sequences, &self.device);
        let probabilities = self.model.forward_probability(input);

        let probabilities = probabilities
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| PipelineError::Inference(format!("cannot read model output: {e:?}")))?;

        tracing::debug!("Scored {} sequences", probabilities.len());
        Ok(probabilities)
    }

    pub fn model(&self) -> &DisasterClassifier<InferBackend> {
        &self.model
    }

    pub fn config(&self) -> &DisasterClassifierConfig {
        &self.config
    }
}
