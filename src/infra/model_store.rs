// ============================================================
// Layer 6 — Model Store
// ============================================================
// Saves and restores the classifier as a single self-describing
// file, so a new process can rebuild the exact architecture
// before loading the weights into it.
//
// File layout:
//   bytes 0..8      magic "DNLPMDL1"
//   bytes 8..12     header length N (u32, little-endian)
//   bytes 12..12+N  JSON header { "config": DisasterClassifierConfig }
//   rest            full-precision named MessagePack record
//                   produced by burn's NamedMpkBytesRecorder
//
// Loading is strict: wrong magic, an unreadable or invalid header,
// a config whose vocabulary size or sequence length differs from
// the pipeline's, or any weight tensor whose shape disagrees with
// the header are all rejected before anything is handed back.
// burn's `load_record` does not compare shapes itself, and layer
// widths such as `summary_hidden` are rebuilt from the header, so
// every parameter is checked against a model freshly built from
// that header.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::fs;
use std::io;
use std::path::PathBuf;

use burn::{
    module::{ModuleVisitor, ParamId},
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
};
use serde::{Deserialize, Serialize};

use crate::domain::error::{PersistenceError, PipelineError};
use crate::infra::staged_file::StagedFile;
use crate::ml::model::{DisasterClassifier, DisasterClassifierConfig, DisasterClassifierRecord};

pub const MODEL_MAGIC: &[u8; 8] = b"DNLPMDL1";

type WeightsRecorder = NamedMpkBytesRecorder<FullPrecisionSettings>;

#[derive(Debug, Serialize, Deserialize)]
struct ModelHeader {
    config: DisasterClassifierConfig,
}

pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Encode config and weights into a staged file; nothing replaces
    /// the artifact on disk until the caller commits it.
    pub fn stage<B: Backend>(
        &self,
        model: &DisasterClassifier<B>,
        config: &DisasterClassifierConfig,
    ) -> Result<StagedFile, PersistenceError> {
        let header = serde_json::to_vec(&ModelHeader { config: config.clone() })
            .map_err(|e| self.io_error(format!("cannot encode header: {e}")))?;
        let header_len = u32::try_from(header.len())
            .map_err(|_| self.io_error("header too large".to_string()))?;

        let weights = Recorder::<B>::record(&WeightsRecorder::default(), model.clone().into_record(), ())
            .map_err(|e| self.io_error(format!("cannot encode weights: {e:?}")))?;

        let mut bytes = Vec::with_capacity(12 + header.len() + weights.len());
        bytes.extend_from_slice(MODEL_MAGIC);
        bytes.extend_from_slice(&header_len.to_le_bytes());
        bytes.extend_from_slice(&header);
        bytes.extend_from_slice(&weights);

        let staged = StagedFile::write(&self.path, &bytes)?;
        tracing::debug!("Staged model ({} bytes) for '{}'", bytes.len(), self.path.display());
        Ok(staged)
    }

    /// Rebuild the model stored on disk.
    ///
    /// `expected` carries the vocabulary size and sequence length the
    /// caller's tokenizer produces; layer widths are taken from the file.
    pub fn load<B: Backend>(
        &self,
        expected: &DisasterClassifierConfig,
        device: &B::Device,
    ) -> Result<(DisasterClassifier<B>, DisasterClassifierConfig), PersistenceError> {
        let bytes = fs::read(&self.path).map_err(|e| PersistenceError::from_io(&self.path, e))?;

        let (config, weights) = self.split_envelope(&bytes)?;
        config
            .validate()
            .map_err(|e| self.corrupt(format!("unusable model config: {e}")))?;

        if config.vocab_size != expected.vocab_size || config.max_seq_len != expected.max_seq_len {
            return Err(self.incompatible(format!(
                "model expects vocab_size={} max_seq_len={}, pipeline is configured for {} and {}",
                config.vocab_size, config.max_seq_len, expected.vocab_size, expected.max_seq_len
            )));
        }

        let record: DisasterClassifierRecord<B> =
            Recorder::<B>::load(&WeightsRecorder::default(), weights.to_vec(), device)
                .map_err(|e| self.corrupt(format!("cannot decode weights: {e:?}")))?;
        let model = config.init::<B>(device).load_record(record);

        let declared = param_shapes(&config.init::<B>(device));
        let stored = param_shapes(&model);
        if declared.len() != stored.len() {
            return Err(self.incompatible(format!(
                "record holds {} weight tensors, header describes {}",
                stored.len(),
                declared.len()
            )));
        }
        if let Some((i, (want, got))) = declared
            .iter()
            .zip(&stored)
            .enumerate()
            .find(|(_, (want, got))| want != got)
        {
            return Err(self.incompatible(format!(
                "weight tensor #{i} has shape {got:?}, header implies {want:?}"
            )));
        }

        tracing::info!("Loaded model from '{}'", self.path.display());
        Ok((model, config))
    }

    fn split_envelope<'a>(
        &self,
        bytes: &'a [u8],
    ) -> Result<(DisasterClassifierConfig, &'a [u8]), PersistenceError> {
        if bytes.len() < 12 || &bytes[..8] != MODEL_MAGIC {
            return Err(self.corrupt("not a disaster-nlp model file".to_string()));
        }

        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&bytes[8..12]);
        let header_len = u32::from_le_bytes(len_bytes) as usize;

        let body = &bytes[12..];
        if body.len() < header_len {
            return Err(self.corrupt("truncated header".to_string()));
        }
        let (header, weights) = body.split_at(header_len);

        let header: ModelHeader = serde_json::from_slice(header)
            .map_err(|e| self.corrupt(format!("bad header: {e}")))?;
        Ok((header.config, weights))
    }

    fn corrupt(&self, reason: String) -> PersistenceError {
        PersistenceError::Corrupt { path: self.path.clone(), reason }
    }

    fn incompatible(&self, reason: String) -> PersistenceError {
        PersistenceError::Incompatible { path: self.path.clone(), reason }
    }

    fn io_error(&self, reason: String) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source: io::Error::other(reason),
        }
    }
}

/// Move a model's weights onto another backend, e.g. inference weights
/// onto the autodiff backend before warm-start training.
pub fn transfer<S: Backend, D: Backend>(
    model: DisasterClassifier<S>,
    config: &DisasterClassifierConfig,
    device: &D::Device,
) -> Result<DisasterClassifier<D>, PipelineError> {
    let recorder = WeightsRecorder::default();
    let bytes = Recorder::<S>::record(&recorder, model.into_record(), ())
        .map_err(|e| PipelineError::Training(format!("cannot copy weights: {e:?}")))?;
    let record: DisasterClassifierRecord<D> = Recorder::<D>::load(&recorder, bytes, device)
        .map_err(|e| PipelineError::Training(format!("cannot copy weights: {e:?}")))?;
    Ok(config.init::<D>(device).load_record(record))
}

// ─── Shape Check ──────────────────────────────────────────────────────────────
/// Collects the shape of every float parameter in visit order.
struct ShapeCollector {
    shapes: Vec<Vec<usize>>,
}

impl<B: Backend> ModuleVisitor<B> for ShapeCollector {
    fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
        self.shapes.push(tensor.dims().to_vec());
    }
}

fn param_shapes<B: Backend>(model: &DisasterClassifier<B>) -> Vec<Vec<usize>> {
    let mut collector = ShapeCollector { shapes: Vec::new() };
    model.visit(&mut collector);
    collector.shapes
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::tiny_config;
    use crate::ml::{InferBackend, InferDevice};
    use burn::tensor::TensorData;

    fn save(store: &ModelStore, model: &DisasterClassifier<InferBackend>, config: &DisasterClassifierConfig) {
        store.stage(model, config).unwrap().commit().unwrap();
    }

    /// Overwrite the first occurrence of `from` with `to` (same length).
    fn patch(bytes: &mut [u8], from: &str, to: &str) {
        assert_eq!(from.len(), to.len());
        let at = bytes
            .windows(from.len())
            .position(|w| w == from.as_bytes())
            .unwrap();
        bytes[at..at + to.len()].copy_from_slice(to.as_bytes());
    }

    fn ids(device: &InferDevice) -> Tensor<InferBackend, 2, Int> {
        Tensor::from_data(TensorData::new(vec![2i64, 5, 1, 0, 3, 3, 0, 0], [2, 4]), device)
    }

    #[test]
    fn test_round_trip_preserves_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("nested/model.bin"));
        let device = InferDevice::default();
        let config = tiny_config(12, 4);
        let model = config.init::<InferBackend>(&device);

        save(&store, &model, &config);
        let (loaded, loaded_config) = store.load::<InferBackend>(&tiny_config(12, 4), &device).unwrap();

        assert!(loaded_config.same_architecture(&config));
        let before: Vec<f32> = model.forward_probability(ids(&device)).into_data().to_vec().unwrap();
        let after: Vec<f32> = loaded.forward_probability(ids(&device)).into_data().to_vec().unwrap();
        for (a, b) in before.iter().zip(&after) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("absent.bin"));
        let err = store
            .load::<InferBackend>(&tiny_config(12, 4), &InferDevice::default())
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Missing(_)));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, b"definitely not a model").unwrap();

        let err = ModelStore::new(&path)
            .load::<InferBackend>(&tiny_config(12, 4), &InferDevice::default())
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt { .. }));
    }

    #[test]
    fn test_truncated_weights_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let device = InferDevice::default();
        let config = tiny_config(12, 4);
        let store = ModelStore::new(&path);
        save(&store, &config.init::<InferBackend>(&device), &config);

        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(matches!(
            store.load::<InferBackend>(&config, &device),
            Err(PersistenceError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_dimension_mismatch_is_incompatible() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("model.bin"));
        let device = InferDevice::default();
        let config = tiny_config(12, 4);
        save(&store, &config.init::<InferBackend>(&device), &config);

        let err = store.load::<InferBackend>(&tiny_config(12, 9), &device).unwrap_err();
        assert!(matches!(err, PersistenceError::Incompatible { .. }));

        let err = store.load::<InferBackend>(&tiny_config(50, 4), &device).unwrap_err();
        assert!(matches!(err, PersistenceError::Incompatible { .. }));
    }

    #[test]
    fn test_header_widths_must_match_the_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let store = ModelStore::new(&path);
        let device = InferDevice::default();
        let config = tiny_config(12, 4);
        save(&store, &config.init::<InferBackend>(&device), &config);
        let original = fs::read(&path).unwrap();

        for (from, to) in [
            ("\"summary_hidden\":4", "\"summary_hidden\":3"),
            ("\"sequence_hidden\":6", "\"sequence_hidden\":7"),
            ("\"dense_hidden\":5", "\"dense_hidden\":2"),
            ("\"embedding_dim\":8", "\"embedding_dim\":9"),
        ] {
            let mut bytes = original.clone();
            patch(&mut bytes, from, to);
            fs::write(&path, &bytes).unwrap();

            let err = store.load::<InferBackend>(&config, &device).unwrap_err();
            assert!(
                matches!(err, PersistenceError::Incompatible { .. }),
                "{from} -> {to}: {err}"
            );
        }
    }

    #[test]
    fn test_unusable_header_config_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let store = ModelStore::new(&path);
        let device = InferDevice::default();
        let config = tiny_config(12, 4);
        save(&store, &config.init::<InferBackend>(&device), &config);

        let mut bytes = fs::read(&path).unwrap();
        patch(&mut bytes, "\"summary_hidden\":4", "\"summary_hidden\":0");
        fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            store.load::<InferBackend>(&config, &device),
            Err(PersistenceError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_uncommitted_stage_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let device = InferDevice::default();
        let config = tiny_config(12, 4);

        let staged = ModelStore::new(&path)
            .stage(&config.init::<InferBackend>(&device), &config)
            .unwrap();
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn test_transfer_keeps_weights() {
        let device = InferDevice::default();
        let config = tiny_config(12, 4);
        let model = config.init::<InferBackend>(&device);
        let before: Vec<f32> = model.forward_probability(ids(&device)).into_data().to_vec().unwrap();

        let moved = transfer::<InferBackend, InferBackend>(model, &config, &device).unwrap();
        let after: Vec<f32> = moved.forward_probability(ids(&device)).into_data().to_vec().unwrap();
        assert_eq!(before, after);
    }
}
