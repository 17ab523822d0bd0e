// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the two
// pipelines work with.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only data types, errors and the traits other layers implement

/// Ordered category labels with their example names
pub mod category;

/// An aligned, normalised pair of sentences
pub mod sentence_pair;

/// Errors raised by the pipelines themselves
pub mod error;

/// Core abstractions (traits) that other layers implement
pub mod traits;
