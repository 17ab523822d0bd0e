// ============================================================
// Layer 4 - Letter Alphabet (one-hot encoding)
// ============================================================
// The classifier reads names one character at a time. Each
// character becomes a one-hot vector over a fixed alphabet:
//
//   a..z A..Z ' ' '.' ',' ';' '\''    (57 symbols)
//
//   'a' -> [1, 0, 0, ..., 0]
//   'b' -> [0, 1, 0, ..., 0]
//
// A name of length L becomes an L x 57 matrix, stored row-major
// in one flat Vec<f32> so Layer 5 can turn it into a tensor with
// a single reshape.
//
// The alphabet is static: unlike the translation vocabulary it
// never grows, and the name normalizer guarantees every character
// it lets through has a position here.

use crate::domain::error::NlpError;

pub const ALL_LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ .,;'";

/// Number of symbols in the alphabet (width of a one-hot vector).
pub const N_LETTERS: usize = 57;

pub struct Alphabet;

impl Alphabet {
    pub fn contains(c: char) -> bool {
        Self::letter_index(c).is_some()
    }

    /// Position of `c` in `ALL_LETTERS`, e.g. 'a' = 0, 'A' = 26.
    pub fn letter_index(c: char) -> Option<usize> {
        match c {
            'a'..='z' => Some(c as usize - 'a' as usize),
            'A'..='Z' => Some(26 + c as usize - 'A' as usize),
            ' ' => Some(52),
            '.' => Some(53),
            ',' => Some(54),
            ';' => Some(55),
            '\'' => Some(56),
            _ => None,
        }
    }

    pub fn letter(index: usize) -> Option<char> {
        ALL_LETTERS.chars().nth(index)
    }

    /// A `N_LETTERS` vector with a single 1.0 at the letter's position.
    pub fn one_hot(c: char) -> Result<Vec<f32>, NlpError> {
        let index = Self::letter_index(c).ok_or(NlpError::UnknownLetter(c))?;
        let mut v = vec![0.0; N_LETTERS];
        v[index] = 1.0;
        Ok(v)
    }

    /// Encode a whole line as a flat `len x N_LETTERS` matrix.
    pub fn line_to_one_hot(line: &str) -> Result<Vec<f32>, NlpError> {
        let len = line.chars().count();
        if len == 0 {
            return Err(NlpError::EmptySequence);
        }

        let mut flat = vec![0.0; len * N_LETTERS];
        for (row, c) in line.chars().enumerate() {
            let index = Self::letter_index(c).ok_or(NlpError::UnknownLetter(c))?;
            flat[row * N_LETTERS + index] = 1.0;
        }
        Ok(flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_size_matches_constant() {
        assert_eq!(ALL_LETTERS.chars().count(), N_LETTERS);
    }

    #[test]
    fn test_index_agrees_with_letter_string() {
        for (i, c) in ALL_LETTERS.chars().enumerate() {
            assert_eq!(Alphabet::letter_index(c), Some(i));
            assert_eq!(Alphabet::letter(i), Some(c));
        }
    }

    #[test]
    fn test_one_hot_has_single_one() {
        let v = Alphabet::one_hot('J').unwrap();
        assert_eq!(v.len(), N_LETTERS);
        assert_eq!(v.iter().filter(|&&x| x == 1.0).count(), 1);
        assert_eq!(v[Alphabet::letter_index('J').unwrap()], 1.0);
    }

    #[test]
    fn test_line_to_one_hot_rows() {
        let flat = Alphabet::line_to_one_hot("Jones").unwrap();
        assert_eq!(flat.len(), 5 * N_LETTERS);
        // second row is 'o'
        let row = &flat[N_LETTERS..2 * N_LETTERS];
        assert_eq!(row[Alphabet::letter_index('o').unwrap()], 1.0);
        assert_eq!(row.iter().sum::<f32>(), 1.0);
    }

    #[test]
    fn test_unknown_letter_rejected() {
        assert!(matches!(Alphabet::one_hot('é'), Err(NlpError::UnknownLetter('é'))));
        assert!(matches!(Alphabet::line_to_one_hot("ab3"), Err(NlpError::UnknownLetter('3'))));
        assert!(matches!(Alphabet::line_to_one_hot(""), Err(NlpError::EmptySequence)));
    }
}
