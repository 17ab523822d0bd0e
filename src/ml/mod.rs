// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// The Burn-specific half of the crate: layer wiring, the
// optimisation step, and evaluation.
//
//   classifier.rs  - CharRnn: two linear maps over
//                    [letter ; hidden], one letter per step
//
//   seq2seq.rs     - EncoderRnn (embedding + GRU) and
//                    AttnDecoderRnn (additive attention + GRU)
//
//   trainer.rs     - backend-free iteration loop, loss windows
//                    and progress lines
//
//   inferencer.rs  - top-n name prediction, confusion matrix,
//                    greedy translation with attention weights
//
// Training runs on TrainBackend; `model.valid()` hands the same
// weights to InferBackend for evaluation.

/// Gradient-tracking backend used by the learners
pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

/// Plain CPU backend for evaluation and loaded checkpoints
pub type InferBackend = burn::backend::NdArray;

/// Character-level RNN name classifier
pub mod classifier;

/// Encoder and attention decoder for translation
pub mod seq2seq;

/// Iteration-driven training loop
pub mod trainer;

/// Evaluation of trained models
pub mod inferencer;
