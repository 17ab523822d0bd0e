// ============================================================
// Layer 3 - Domain Errors
// ============================================================
// Every failure the pipelines can raise on their own, as opposed
// to I/O or framework failures which travel as anyhow errors.
//
// None of these are recoverable: the corpus is a static
// prerequisite and the vocabularies are closed, so the
// application layer simply propagates them with `?` and the
// run aborts.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NlpError {
    /// A word was never registered with `Vocabulary::add`.
    #[error("unknown symbol '{symbol}' in vocabulary '{vocabulary}'")]
    UnknownSymbol { symbol: String, vocabulary: String },

    /// A character is outside the fixed letter alphabet.
    #[error("character {0:?} is outside the letter alphabet")]
    UnknownLetter(char),

    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    #[error("category index {index} is out of range ({len} categories)")]
    CategoryIndexOutOfRange { index: usize, len: usize },

    /// A bilingual corpus line without a tab separator.
    #[error("line {line} of '{path}' is not a tab separated sentence pair")]
    MalformedPair { path: String, line: usize },

    #[error("sequence of {len} tokens exceeds the maximum length {max}")]
    SequenceTooLong { len: usize, max: usize },

    #[error("cannot encode an empty sequence")]
    EmptySequence,

    #[error("no training examples available")]
    EmptyTrainingSet,

    #[error("text normalisation failed: {0}")]
    Normalize(String),
}
