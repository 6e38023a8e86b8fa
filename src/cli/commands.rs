// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `predict` and `serve`
// and all their configurable flags.
//
// Artifact paths, host and port can also come from the
// environment (NLP_MODEL_PATH, NLP_TOKENIZER_PATH, HOST, PORT),
// which is how the server is normally configured in deployment.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::pipeline::{DEFAULT_MAX_SEQUENCE_LENGTH, DEFAULT_MAX_WORDS};
use crate::application::train_use_case::TrainConfig;
use crate::data::splitter::SplitStrategy;
use crate::domain::prediction::DEFAULT_THRESHOLD;
use crate::ml::trainer::TrainingOptions;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the classifier on labelled posts and save the artifacts
    Train(TrainArgs),

    /// Classify one or more texts with saved artifacts
    Predict(PredictArgs),

    /// Serve /analyze and /health over HTTP
    Serve(ServeArgs),
}

/// Where the model/tokenizer pair lives, plus the tokenizer limits
/// it must have been fitted with.
#[derive(Args, Debug, Clone)]
pub struct ArtifactArgs {
    #[arg(long, env = "NLP_MODEL_PATH", default_value = "disaster_nlp_model.bin")]
    pub model_path: PathBuf,

    #[arg(long, env = "NLP_TOKENIZER_PATH", default_value = "tokenizer.json")]
    pub tokenizer_path: PathBuf,

    /// Vocabulary cap, including the padding and OOV ids
    #[arg(long, default_value_t = DEFAULT_MAX_WORDS)]
    pub max_words: usize,

    /// Every text is padded or truncated to this many words
    #[arg(long, default_value_t = DEFAULT_MAX_SEQUENCE_LENGTH)]
    pub max_seq_len: usize,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSON Lines file with one {"text": ..., "label": 0|1} per line
    #[arg(long, default_value = "data/sample_posts.jsonl")]
    pub data: PathBuf,

    #[command(flatten)]
    pub artifacts: ArtifactArgs,

    /// Maximum number of passes over the training data
    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Fraction of posts held out for early stopping (0 disables it)
    #[arg(long, default_value_t = 0.2)]
    pub validation_split: f64,

    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Epochs without validation improvement before stopping
    #[arg(long, default_value_t = 3)]
    pub patience: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Shuffle posts (with --seed) before holding out the validation tail
    #[arg(long)]
    pub shuffle_split: bool,

    /// Append per-epoch metrics to this CSV file
    #[arg(long)]
    pub metrics_csv: Option<PathBuf>,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        let split = if a.shuffle_split {
            SplitStrategy::Shuffled { seed: a.seed }
        } else {
            SplitStrategy::Tail
        };

        TrainConfig {
            data_path: a.data,
            model_path: a.artifacts.model_path,
            tokenizer_path: a.artifacts.tokenizer_path,
            max_words: a.artifacts.max_words,
            max_seq_len: a.artifacts.max_seq_len,
            options: TrainingOptions {
                validation_split: a.validation_split,
                epochs: a.epochs,
                batch_size: a.batch_size,
                learning_rate: a.learning_rate,
                patience: a.patience,
                seed: a.seed,
                split,
                metrics_csv: a.metrics_csv,
            },
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Text to classify; repeat for several
    #[arg(long, required = true)]
    pub text: Vec<String>,

    /// Probabilities at or above this are labelled 1
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f32,

    #[command(flatten)]
    pub artifacts: ArtifactArgs,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 5001)]
    pub port: u16,

    #[command(flatten)]
    pub artifacts: ArtifactArgs,

    /// Start even if the artifacts cannot be loaded; /analyze then fails
    #[arg(long)]
    pub allow_unloaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_flags_reach_the_config() {
        let cli = Cli::try_parse_from([
            "disaster-nlp",
            "train",
            "--data",
            "posts.jsonl",
            "--epochs",
            "5",
            "--shuffle-split",
            "--seed",
            "7",
        ])
        .unwrap();

        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        let config = TrainConfig::from(args);
        assert_eq!(config.data_path, PathBuf::from("posts.jsonl"));
        assert_eq!(config.options.epochs, 5);
        assert_eq!(config.options.split, SplitStrategy::Shuffled { seed: 7 });
        assert_eq!(config.options.patience, 3);
        assert_eq!(config.max_words, DEFAULT_MAX_WORDS);
    }

    #[test]
    fn test_predict_accepts_repeated_text() {
        let cli = Cli::try_parse_from([
            "disaster-nlp",
            "predict",
            "--text",
            "fire downtown",
            "--text",
            "lovely weather",
        ])
        .unwrap();
        let Commands::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.text.len(), 2);
        assert_eq!(args.threshold, DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_predict_requires_text() {
        assert!(Cli::try_parse_from(["disaster-nlp", "predict"]).is_err());
    }
}
