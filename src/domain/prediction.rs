// ============================================================
// Layer 3 — Prediction Domain Types
// ============================================================
// The output of one inference call: one probability and one
// binary label per input text, in input order.

use serde::{Deserialize, Serialize};

/// Decision threshold used when the caller does not supply one.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Map a disaster probability to a binary label.
///
/// The comparison is inclusive: a probability exactly equal to
/// the threshold is classified as disaster-related.
pub fn label_for(probability: f32, threshold: f32) -> u8 {
    u8::from(probability >= threshold)
}

/// Results for a batch of texts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionBatch {
    /// Binary label per text (1 = disaster-related)
    pub predictions: Vec<u8>,

    /// Sigmoid output per text, in [0, 1]
    pub probabilities: Vec<f32>,
}

impl PredictionBatch {
    /// Build a batch by thresholding raw probabilities.
    pub fn from_probabilities(probabilities: Vec<f32>, threshold: f32) -> Self {
        let predictions = probabilities
            .iter()
            .map(|&p| label_for(p, threshold))
            .collect();
        Self {
            predictions,
            probabilities,
        }
    }

    /// Same labels as `predictions`; kept as its own accessor because
    /// the HTTP response reports them under both names.
    pub fn is_disaster_related(&self) -> Vec<u8> {
        self.predictions.clone()
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}
