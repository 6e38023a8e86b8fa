// ============================================================
// Layer 4 — Post Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<PostSample>
// into tensors.
//
// How batching works here:
//   Input:  Vec of N PostSamples, each with sequences of length S
//   Output: PostBatch with input_ids [N, S] and labels [N]
//
// All sequences are already padded to the same length by the
// tokenizer, so flattening then reshaping is enough.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::PostSample;

// ─── PostBatch ────────────────────────────────────────────────────────────────
/// A batch of posts ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct PostBatch<B: Backend> {
    /// Word ID sequences — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Ground truth labels — shape: [batch_size], values 0 or 1
    pub labels: Tensor<B, 1, Int>,
}

// ─── PostBatcher ──────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on the right
/// CPU/GPU.
#[derive(Clone, Debug)]
pub struct PostBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> PostBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

/// Stack encoded sequences into a [batch, seq_len] Int tensor.
pub fn sequences_to_tensor<B: Backend>(
    sequences: &[Vec<u32>],
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let batch_size = sequences.len();
    let seq_len = sequences.first().map(Vec::len).unwrap_or(0);

    let flat: Vec<i64> = sequences
        .iter()
        .flat_map(|s| s.iter().map(|&id| id as i64))
        .collect();

    Tensor::<B, 2, Int>::from_data(TensorData::new(flat, [batch_size, seq_len]), device)
}

impl<B: Backend> Batcher<PostSample, PostBatch<B>> for PostBatcher<B> {
    fn batch(&self, items: Vec<PostSample>) -> PostBatch<B> {
        let sequences: Vec<Vec<u32>> = items.iter().map(|s| s.input_ids.clone()).collect();
        let input_ids = sequences_to_tensor::<B>(&sequences, &self.device);

        let labels: Vec<i64> = items.iter().map(|s| s.label as i64).collect();
        let labels = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [items.len()]),
            &self.device,
        );

        PostBatch { input_ids, labels }
    }
}
