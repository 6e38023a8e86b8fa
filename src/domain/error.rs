use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading or writing the model/tokenizer artifact pair.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// One of the two artifact files does not exist.
    #[error("artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("cannot access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but its contents cannot be decoded.
    #[error("corrupt artifact '{}': {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// The file decodes but was produced for different dimensions.
    #[error("incompatible artifact '{}': {reason}", .path.display())]
    Incompatible { path: PathBuf, reason: String },
}

impl PersistenceError {
    /// Classify an I/O error, turning "not found" into `Missing`.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::Missing(path)
        } else {
            Self::Io { path, source }
        }
    }
}

/// Errors surfaced by the classification pipeline.
///
/// Each variant is a distinct kind so the HTTP boundary can map
/// kind to status code without inspecting messages.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Encode or predict was attempted without a vocabulary and model.
    #[error("Model must be trained or loaded before prediction")]
    NotFitted,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Malformed caller input.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("training failed: {0}")]
    Training(String),

    #[error("inference failed: {0}")]
    Inference(String),
}
