// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training or analysing posts).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The owned tokenizer + model pair
pub mod pipeline;

// The training workflow
pub mod train_use_case;

// Prediction plus keywords, shared by the CLI and the server
pub mod analyze_use_case;
