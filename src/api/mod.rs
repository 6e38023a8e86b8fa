// ============================================================
// Layer 1 — HTTP Presentation Layer
// ============================================================
// A thin axum server in front of the pipeline:
//
//   POST /analyze   {"text": "..."} or {"text": ["...", ...]}
//                   → predictions, probabilities,
//                     is_disaster_related, keywords
//   GET  /health    → {"status": "healthy", "model_loaded": bool}
//
// Like the CLI, this layer only translates between the wire
// format and Layer 2; every decision is made by the pipeline.
//
// Reference: axum documentation (Router, State, extractors)
//            tower-http documentation (CorsLayer, TraceLayer)

/// Router, handlers and error mapping
pub mod server;
