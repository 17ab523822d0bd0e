// ============================================================
// Layer 4 - Word Vocabulary
// ============================================================
// Maps words to dense indices for the translation pipeline.
//
// Indices are handed out in first-seen order and never change:
//
//   new("fra")           -> { SOS: 0, EOS: 1 }
//   add_sentence("je suis")   -> je = 2, suis = 3
//   add_sentence("je vais")   -> je stays 2 (count 2), vais = 4
//
// The two markers occupy indices 0 and 1 but are not words: they
// only exist in the reverse (index -> word) table. A corpus word
// spelt "SOS" would get its own index.
//
// The vocabulary is closed. Every word must be registered with
// `add` before it can be encoded, and unknown words are an error
// rather than an <UNK> fallback.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::NlpError;

/// Start-of-sequence marker: first decoder input.
pub const SOS_TOKEN: usize = 0;
/// End-of-sequence marker: terminates every encoded sentence.
pub const EOS_TOKEN: usize = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    name:        String,
    word2index:  HashMap<String, usize>,
    word2count:  HashMap<String, usize>,
    index2word:  Vec<String>,
}

impl Vocabulary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:       name.into(),
            word2index: HashMap::new(),
            word2count: HashMap::new(),
            index2word: vec!["SOS".to_string(), "EOS".to_string()],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register every whitespace separated word of `sentence`.
    pub fn add_sentence(&mut self, sentence: &str) {
        for word in sentence.split_whitespace() {
            self.add(word);
        }
    }

    /// Register one word and return its index.
    pub fn add(&mut self, word: &str) -> usize {
        if let Some(&index) = self.word2index.get(word) {
            *self.word2count.entry(word.to_string()).or_insert(0) += 1;
            return index;
        }

        let index = self.index2word.len();
        self.word2index.insert(word.to_string(), index);
        self.word2count.insert(word.to_string(), 1);
        self.index2word.push(word.to_string());
        index
    }

    /// Number of indices in use, markers included.
    pub fn len(&self) -> usize {
        self.index2word.len()
    }

    /// True while only the two markers are registered.
    pub fn is_empty(&self) -> bool {
        self.word2index.is_empty()
    }

    pub fn index(&self, word: &str) -> Option<usize> {
        self.word2index.get(word).copied()
    }

    pub fn count(&self, word: &str) -> usize {
        self.word2count.get(word).copied().unwrap_or(0)
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.index2word.get(index).map(String::as_str)
    }

    /// Index of every word, without a terminator.
    pub fn indexes(&self, sentence: &str) -> Result<Vec<usize>, NlpError> {
        sentence
            .split_whitespace()
            .map(|word| {
                self.index(word).ok_or_else(|| NlpError::UnknownSymbol {
                    symbol:     word.to_string(),
                    vocabulary: self.name.clone(),
                })
            })
            .collect()
    }

    /// `indexes` followed by `EOS_TOKEN`.
    pub fn encode(&self, sentence: &str) -> Result<Vec<usize>, NlpError> {
        let mut ids = self.indexes(sentence)?;
        ids.push(EOS_TOKEN);
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_preregistered() {
        let v = Vocabulary::new("fra");
        assert_eq!(v.len(), 2);
        assert_eq!(v.word(SOS_TOKEN), Some("SOS"));
        assert_eq!(v.word(EOS_TOKEN), Some("EOS"));
        assert!(v.is_empty());
    }

    #[test]
    fn test_first_seen_order() {
        let mut v = Vocabulary::new("fra");
        v.add_sentence("je suis");
        v.add_sentence("je vais");
        assert_eq!(v.index("je"), Some(2));
        assert_eq!(v.index("suis"), Some(3));
        assert_eq!(v.index("vais"), Some(4));
        assert_eq!(v.count("je"), 2);
        assert_eq!(v.count("vais"), 1);
        assert_eq!(v.len(), 5);
    }

    #[test]
    fn test_add_is_idempotent_on_index() {
        let mut v = Vocabulary::new("eng");
        let first = v.add("cold");
        let again = v.add("cold");
        assert_eq!(first, again);
        assert_eq!(v.count("cold"), 2);
        assert_eq!(v.word(first), Some("cold"));
    }

    #[test]
    fn test_encode_is_stable_and_terminated() {
        let mut v = Vocabulary::new("eng");
        v.add_sentence("i am cold .");
        let a = v.encode("i am cold .").unwrap();
        let b = v.encode("i am cold .").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, vec![2, 3, 4, 5, EOS_TOKEN]);
        assert_eq!(*a.last().unwrap(), EOS_TOKEN);
    }

    #[test]
    fn test_unknown_word_fails() {
        let mut v = Vocabulary::new("eng");
        v.add_sentence("i am");
        let err = v.encode("i am here").unwrap_err();
        assert!(matches!(
            err,
            NlpError::UnknownSymbol { ref symbol, ref vocabulary } if symbol == "here" && vocabulary == "eng"
        ));
    }

    #[test]
    fn test_empty_sentence_encodes_to_eos() {
        let v = Vocabulary::new("eng");
        assert_eq!(v.encode("").unwrap(), vec![EOS_TOKEN]);
    }

    #[test]
    fn test_json_round_trip_keeps_indices() {
        let mut v = Vocabulary::new("eng");
        v.add_sentence("we are here .");
        let json = serde_json::to_string(&v).unwrap();
        let back: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.encode("here we are").unwrap(), v.encode("here we are").unwrap());
        assert_eq!(back.name(), "eng");
    }
}
