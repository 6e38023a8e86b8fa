use burn::{
    nn::{
        loss::BinaryCrossEntropyLossConfig,
        BiLstm, BiLstmConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

use crate::data::tokenizer::validate_limits;
use crate::domain::error::PipelineError;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct DisasterClassifierConfig {
    /// Embedding table rows; equals the tokenizer's `max_words`
    pub vocab_size: usize,
    /// Fixed input sequence length
    pub max_seq_len: usize,
    #[config(default = 100)]
    pub embedding_dim: usize,
    /// Hidden width of the first (sequence-returning) BiLSTM
    #[config(default = 64)]
    pub sequence_hidden: usize,
    /// Hidden width of the second (summarising) BiLSTM
    #[config(default = 32)]
    pub summary_hidden: usize,
    #[config(default = 24)]
    pub dense_hidden: usize,
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl DisasterClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DisasterClassifier<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device);
        let sequence_encoder =
            BiLstmConfig::new(self.embedding_dim, self.sequence_hidden, true).init(device);
        let summary_encoder =
            BiLstmConfig::new(2 * self.sequence_hidden, self.summary_hidden, true).init(device);
        let dense = LinearConfig::new(2 * self.summary_hidden, self.dense_hidden).init(device);
        let output = LinearConfig::new(self.dense_hidden, 1).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();

        DisasterClassifier {
            embedding,
            sequence_encoder,
            summary_encoder,
            dense,
            output,
            dropout,
            summary_hidden: self.summary_hidden,
        }
    }

    /// Reject configs that would build an unusable model: tokenizer
    /// limits without room for the reserved ids, zero-width layers or
    /// a dropout rate outside [0, 1).
    pub fn validate(&self) -> Result<(), PipelineError> {
        validate_limits(self.vocab_size, self.max_seq_len)?;

        let widths = [
            ("embedding_dim", self.embedding_dim),
            ("sequence_hidden", self.sequence_hidden),
            ("summary_hidden", self.summary_hidden),
            ("dense_hidden", self.dense_hidden),
        ];
        if let Some((name, _)) = widths.iter().find(|(_, w)| *w == 0) {
            return Err(PipelineError::Validation(format!("{name} must be positive")));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(PipelineError::Validation(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }

    /// True when both configs build tensors of identical shapes.
    pub fn same_architecture(&self, other: &Self) -> bool {
        self.vocab_size == other.vocab_size
            && self.max_seq_len == other.max_seq_len
            && self.embedding_dim == other.embedding_dim
            && self.sequence_hidden == other.sequence_hidden
            && self.summary_hidden == other.summary_hidden
            && self.dense_hidden == other.dense_hidden
    }
}

#[derive(Module, Debug)]
pub struct DisasterClassifier<B: Backend> {
    pub embedding: Embedding<B>,
    pub sequence_encoder: BiLstm<B>,
    pub summary_encoder: BiLstm<B>,
    pub dense: Linear<B>,
    pub output: Linear<B>,
    pub dropout: Dropout,
    pub summary_hidden: usize,
}

impl<B: Backend> DisasterClassifier<B> {
    /// input_ids: [batch, seq_len] → logits: [batch, 1]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch_size, seq_len] = input_ids.dims();
        let h = self.summary_hidden;

        let x = self.embedding.forward(input_ids); // [batch, seq, embed]
        let (x, _) = self.sequence_encoder.forward(x, None); // [batch, seq, 2*64]
        let x = self.dropout.forward(x);
        let (x, _) = self.summary_encoder.forward(x, None); // [batch, seq, 2*32]

        // The summary vector is the forward direction's last step joined
        // with the reverse direction's last step, which sits at t = 0.
        let forward_last = x
            .clone()
            .slice([0..batch_size, seq_len - 1..seq_len, 0..h]);
        let reverse_last = x.slice([0..batch_size, 0..1, h..2 * h]);
        let summary = Tensor::cat(vec![forward_last, reverse_last], 2).reshape([batch_size, 2 * h]);

        let x = self.dropout.forward(summary);
        let x = relu(self.dense.forward(x));
        let x = self.dropout.forward(x);
        self.output.forward(x)
    }

    /// input_ids: [batch, seq_len] → disaster probabilities: [batch]
    pub fn forward_probability(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        sigmoid(self.forward(input_ids)).flatten::<1>(0, 1)
    }

    /// Binary cross-entropy on logits. Returns (loss, logits[batch]).
    pub fn forward_loss(
        &self,
        input_ids: Tensor<B, 2, Int>,
        labels: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 1>) {
        let logits = self.forward(input_ids).flatten::<1>(0, 1);
        let bce = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&logits.device());
        let loss = bce.forward(logits.clone(), labels);
        (loss, logits)
    }
}

/// Number of correct predictions in a batch, thresholding logits at 0
/// (probability 0.5).
pub fn count_correct<B: Backend>(logits: Tensor<B, 1>, labels: Tensor<B, 1, Int>) -> usize {
    use burn::tensor::ElementConversion;

    let predicted = logits.greater_equal_elem(0.0).int();
    let correct: i64 = predicted
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct as usize
}

/// Narrow widths so model tests finish quickly on CPU.
#[cfg(test)]
pub(crate) fn tiny_config(vocab_size: usize, max_seq_len: usize) -> DisasterClassifierConfig {
    DisasterClassifierConfig::new(vocab_size, max_seq_len)
        .with_embedding_dim(8)
        .with_sequence_hidden(6)
        .with_summary_hidden(4)
        .with_dense_hidden(5)
}
