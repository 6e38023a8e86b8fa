// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains the Burn model, training loop and
// inference engine. The data layer's Dataset/Batcher and the
// infra layer's recorders are the only other places that
// touch Burn types.
//
//   model.rs      — Embedding → BiLSTM(64) → Dropout →
//                   BiLSTM(32) summary → Dropout →
//                   Dense(24, ReLU) → Dropout → Dense(1)
//
//   trainer.rs    — Mini-batch Adam training with
//                   validation-loss early stopping
//
//   inferencer.rs — Forward pass on the inner (non-autodiff)
//                   backend, returning probabilities
//
// Backends:
//   Training runs on Autodiff<InferBackend>; dropout is only
//   active there. `model.valid()` moves weights to the inner
//   backend for validation and serving. Build with
//   `--features wgpu` to use the GPU instead of the CPU.
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// BiLSTM disaster classifier architecture
pub mod model;

/// Training loop with early stopping
pub mod trainer;

/// Inference engine
pub mod inferencer;

#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

pub type InferDevice = <InferBackend as burn::tensor::backend::Backend>::Device;
