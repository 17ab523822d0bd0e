// ============================================================
// Layer 4 - Text Normalizers
// ============================================================
// Canonicalise raw corpus text before it reaches a vocabulary.
//
// Both corpora contain accented letters ("Ślusàrski",
// "Ça va ?"). Vocabulary indices must not depend on how a
// character happened to be encoded, so every line goes through:
//
//   1. Unicode canonical decomposition (NFD): "à" -> "a" + U+0300
//   2. Removal of the combining marks left behind
//   3. A pipeline-specific alphabet filter
//
// Steps 1-2 are the `tokenizers` crate's NFD and StripAccents
// normalizers. Step 3 is plain char iteration.
//
// Both normalizers are idempotent: normalising twice gives the
// same string as normalising once.

use tokenizers::normalizers::{StripAccents, NFD};
use tokenizers::{NormalizedString, Normalizer};

use crate::data::alphabet::Alphabet;
use crate::domain::error::NlpError;

/// Decompose and drop combining marks.
fn strip_accents(raw: &str) -> Result<String, NlpError> {
    let mut normalized = NormalizedString::from(raw);
    NFD.normalize(&mut normalized)
        .map_err(|e| NlpError::Normalize(e.to_string()))?;
    StripAccents.normalize(&mut normalized)
        .map_err(|e| NlpError::Normalize(e.to_string()))?;
    Ok(normalized.get().to_string())
}

// ─── NameNormalizer ──────────────────────────────────────────────────────────
/// Classifier variant: keeps only the 57 letters of `Alphabet`.
pub struct NameNormalizer;

impl NameNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, raw: &str) -> Result<String, NlpError> {
        Ok(strip_accents(raw)?
            .chars()
            .filter(|&c| Alphabet::contains(c))
            .collect())
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── SentenceNormalizer ──────────────────────────────────────────────────────
/// Translation variant.
///
///   "Va, vite!"  ->  "va vite !"
///   "J'ai 19 ans."  ->  "j ai ans ."
pub struct SentenceNormalizer;

impl SentenceNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, raw: &str) -> Result<String, NlpError> {
        let ascii = strip_accents(raw.to_lowercase().trim())?;

        // Detach sentence-final punctuation from the word before it
        let mut spaced = String::with_capacity(ascii.len() + 4);
        for c in ascii.chars() {
            if is_sentence_punct(c) {
                spaced.push(' ');
            }
            spaced.push(c);
        }

        // Any run of characters outside a-z . ! ? becomes one space
        let mut out    = String::with_capacity(spaced.len());
        let mut in_gap = false;
        for c in spaced.chars() {
            if c.is_ascii_lowercase() || is_sentence_punct(c) {
                out.push(c);
                in_gap = false;
            } else if !in_gap {
                out.push(' ');
                in_gap = true;
            }
        }

        Ok(out.trim().to_string())
    }
}

impl Default for SentenceNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_sentence_punct(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_diacritics_stripped() {
        let n = NameNormalizer::new();
        assert_eq!(n.normalize("Ślusàrski").unwrap(), "Slusarski");
    }

    #[test]
    fn test_name_drops_foreign_characters() {
        let n = NameNormalizer::new();
        assert_eq!(n.normalize("O'Neal-Smith 3rd").unwrap(), "O'NealSmith rd");
        assert_eq!(n.normalize("Ng, Jr.").unwrap(), "Ng, Jr.");
    }

    #[test]
    fn test_name_idempotent() {
        let n = NameNormalizer::new();
        for raw in ["Ślusàrski", "Nguyễn", "Müller", "  Żółć ", "abc"] {
            let once = n.normalize(raw).unwrap();
            assert_eq!(n.normalize(&once).unwrap(), once);
        }
    }

    #[test]
    fn test_sentence_punctuation_spacing() {
        let n = SentenceNormalizer::new();
        assert_eq!(n.normalize("Va, vite!").unwrap(), "va vite !");
        assert_eq!(n.normalize("Je suis froid.").unwrap(), "je suis froid .");
        assert_eq!(n.normalize("Qui?!").unwrap(), "qui ? !");
    }

    #[test]
    fn test_sentence_accents_and_case() {
        let n = SentenceNormalizer::new();
        assert_eq!(n.normalize("  Ça a été ÉCRIT.  ").unwrap(), "ca a ete ecrit .");
    }

    #[test]
    fn test_sentence_collapses_foreign_runs() {
        let n = SentenceNormalizer::new();
        assert_eq!(n.normalize("J'ai 19 ans.").unwrap(), "j ai ans .");
        assert_eq!(n.normalize("hello 42").unwrap(), "hello");
    }

    #[test]
    fn test_sentence_idempotent() {
        let n = SentenceNormalizer::new();
        for raw in ["Va, vite!", "J'ai 19 ans.", "...", "Où es-tu ?", "", "x 1"] {
            let once = n.normalize(raw).unwrap();
            assert_eq!(n.normalize(&once).unwrap(), once, "input {raw:?}");
        }
    }
}
