// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, traits and errors that define the core
// concepts of the classifier.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Every other layer speaks in these types, so the HTTP layer
// can be tested with a stub classifier and the ML layer never
// has to know about requests or files.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A labelled training post
pub mod post;

// Per-text prediction results and the threshold rule
pub mod prediction;

// Core abstractions (traits) that other layers implement
pub mod traits;

// Classified error kinds shared by every layer
pub mod error;
