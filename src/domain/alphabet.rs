//! Mapping between class indices and text.

use crate::core::errors::{OCRError, OcrResult};

/// The symbols a network can emit, without the blank.
///
/// The blank class sits right after the last symbol, so
/// `blank_index() == len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<String>,
}

impl Alphabet {
    /// Creates an alphabet from its symbols.
    pub fn new(symbols: Vec<String>) -> OcrResult<Self> {
        if symbols.is_empty() {
            return Err(OCRError::config_error("alphabet must not be empty"));
        }
        Ok(Self { symbols })
    }

    /// Creates an alphabet with one symbol per character of `letters`.
    pub fn from_chars(letters: &str) -> OcrResult<Self> {
        Self::new(letters.chars().map(String::from).collect())
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false; empty alphabets are rejected on construction.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Index of the blank class.
    pub fn blank_index(&self) -> usize {
        self.symbols.len()
    }

    /// Returns the symbol of class `index`, or `None` for the blank and
    /// anything beyond it.
    pub fn symbol(&self, index: usize) -> Option<&str> {
        self.symbols.get(index).map(String::as_str)
    }

    /// Concatenates the symbols of `values`, skipping indices outside the
    /// alphabet.
    pub fn decode(&self, values: impl IntoIterator<Item = usize>) -> String {
        values
            .into_iter()
            .filter_map(|value| self.symbol(value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_maps_in_order() {
        let alphabet = Alphabet::from_chars("AB").unwrap();
        assert_eq!(alphabet.blank_index(), 2);
        assert_eq!(alphabet.decode([0, 1, 0]), "ABA");
    }

    #[test]
    fn test_decode_skips_blank_and_out_of_range() {
        let alphabet = Alphabet::from_chars("AB").unwrap();
        assert_eq!(alphabet.decode([1, 2, 7, 0]), "BA");
    }

    #[test]
    fn test_word_symbols() {
        let alphabet = Alphabet::new(vec!["bus".into(), "car".into()]).unwrap();
        assert_eq!(alphabet.decode([1]), "car");
    }

    #[test]
    fn test_empty_alphabet_rejected() {
        assert!(Alphabet::from_chars("").is_err());
    }
}
