// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The seams between the pipeline stages:
//
//   CorpusSource   -> loaders (names directory, bilingual file)
//   ExampleSampler -> draws training examples at random
//   Learner        -> encodes an example and runs one optimisation
//                     step on whatever model backs it
//
// The training loop in Layer 5 is written only against these
// traits, so it never sees a tensor. The Burn-backed learners
// implement `Learner`; tests implement it with plain counters.

use anyhow::Result;
use rand::Rng;

// ─── CorpusSource ────────────────────────────────────────────────────────────
/// Anything that can produce a corpus from static files.
///
/// Implementations:
///   - NamesLoader -> CategorySet from a directory of .txt files
///   - PairLoader  -> Vec<SentencePair> from a tab separated file
pub trait CorpusSource {
    type Corpus;

    /// Load the full corpus. Any failure is fatal for the run.
    fn load(&self) -> Result<Self::Corpus>;
}

// ─── TrainingExample ─────────────────────────────────────────────────────────
/// What the progress report needs to know about an example.
pub trait TrainingExample {
    /// Text fed to the model (a name, a source sentence).
    fn input_text(&self) -> &str;

    /// The label or target sentence the model should produce.
    fn expected(&self) -> &str;
}

// ─── ExampleSampler ──────────────────────────────────────────────────────────
/// Draws one example per call, with replacement.
pub trait ExampleSampler {
    type Item;

    /// `None` only when there is nothing to sample from.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Self::Item>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─── Learner ─────────────────────────────────────────────────────────────────
/// Result of one optimisation step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Loss of this example (per target token for sequences)
    pub loss: f64,
    /// The model's guess while training on this example
    pub prediction: String,
}

/// A model plus its optimiser, seen from the training loop.
///
/// `step` covers forward pass, loss, gradient computation and the
/// parameter update. How those happen is the implementation's
/// business.
pub trait Learner {
    type Example: TrainingExample;
    type Encoded;

    fn encode(&self, example: &Self::Example) -> Result<Self::Encoded>;

    fn step<R: Rng + ?Sized>(&mut self, encoded: &Self::Encoded, rng: &mut R) -> Result<StepOutcome>;
}
