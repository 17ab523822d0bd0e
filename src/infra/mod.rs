// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// File-system concerns shared by both pipelines:
//
//   checkpoint.rs  - model weights (Burn CompactRecorder) plus
//                    configs, vocabularies and categories as
//                    JSON, so inference can rebuild the exact
//                    architecture that was trained
//
//   metrics.rs     - diagnostic CSVs: loss curve, confusion
//                    matrix, attention heatmaps

/// Model and JSON artifact persistence
pub mod checkpoint;

/// Loss curve, confusion matrix and attention CSV output
pub mod metrics;
