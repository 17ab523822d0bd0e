// ============================================================
// Layer 3 - SentencePair Domain Type
// ============================================================
// One aligned example of the translation corpus, after both
// sides have been normalised:
//
//   input:  "je suis froid ."
//   output: "i am cold ."
//
// Which language is the input depends on the loader's reverse
// flag; once the pair exists, `input` is always what the encoder
// reads and `output` is what the decoder must produce.

use serde::{Deserialize, Serialize};

use crate::domain::traits::TrainingExample;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePair {
    pub input:  String,
    pub output: String,
}

impl SentencePair {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input:  input.into(),
            output: output.into(),
        }
    }

    /// Swap input and output sides.
    pub fn reversed(self) -> Self {
        Self {
            input:  self.output,
            output: self.input,
        }
    }

    pub fn input_len(&self) -> usize {
        self.input.split_whitespace().count()
    }

    pub fn output_len(&self) -> usize {
        self.output.split_whitespace().count()
    }
}

impl TrainingExample for SentencePair {
    fn input_text(&self) -> &str {
        &self.input
    }

    fn expected(&self) -> &str {
        &self.output
    }
}
