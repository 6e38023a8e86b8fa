// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-system concerns shared by training, the CLI and the
// server:
//
//   model_store.rs     — Model artifact (config header + weights)
//                        written with burn's bytes recorder.
//
//   tokenizer_store.rs — Vocabulary artifact as JSON. The model
//                        and tokenizer files are only valid as a
//                        pair.
//
//   staged_file.rs     — Write-to-temp then rename, so both halves
//                        of the pair can be prepared before either
//                        replaces what is on disk.
//
//   metrics.rs         — Per-epoch training metrics, optionally
//                        appended to a CSV file.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Records)

/// Model artifact saving and loading
pub mod model_store;

/// Vocabulary artifact saving and loading
pub mod tokenizer_store;

/// Temp-file staging for artifact writes
pub mod staged_file;

/// Training metrics CSV logger
pub mod metrics;
