//! Regex-based tokenizer for short-form feed text.
//!
//! Normalization runs in a fixed order: lowercase, strip everything except
//! word characters, whitespace, and hyphens, collapse whitespace, split.
//! Tokens of length <= 1 and stop words are dropped, then adjacent-pair
//! bigrams (joined with `_`) are appended to the unigram stream so local
//! word order contributes signal.
//!
//! # Examples
//!
//! ```
//! use feedsift::analysis::tokenizer::TextTokenizer;
//!
//! let tokenizer = TextTokenizer::new().unwrap();
//! let tokens = tokenizer.tokenize("Rust compiler internals!");
//!
//! assert_eq!(
//!     tokens,
//!     vec!["rust", "compiler", "internals", "rust_compiler", "compiler_internals"]
//! );
//! ```

use regex::Regex;

use crate::analysis::stop::DEFAULT_STOP_WORDS_SET;
use crate::error::{Result, SiftError};

/// Tokenizer that converts raw feed text into filtered unigrams and
/// derived bigrams.
#[derive(Debug, Clone)]
pub struct TextTokenizer {
    /// Matches every character that is not a word character, whitespace,
    /// or hyphen.
    strip: Regex,
}

impl TextTokenizer {
    /// Create a new tokenizer with the default normalization pattern.
    pub fn new() -> Result<Self> {
        let strip = Regex::new(r"[^\w\s-]+")
            .map_err(|e| SiftError::analysis(format!("Invalid strip pattern: {e}")))?;

        Ok(TextTokenizer { strip })
    }

    /// Tokenize text into filtered unigrams followed by adjacent-pair bigrams.
    ///
    /// Pure and deterministic; empty input yields an empty vec. Callers are
    /// responsible for handling the empty case (see the classifier's
    /// degenerate-input fallback).
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let stripped = self.strip.replace_all(&lowered, " ");

        let unigrams: Vec<String> = stripped
            .split_whitespace()
            .filter(|token| token.chars().count() > 1)
            .filter(|token| !DEFAULT_STOP_WORDS_SET.contains(token))
            .map(|token| token.to_string())
            .collect();

        let bigrams: Vec<String> = unigrams
            .windows(2)
            .map(|pair| format!("{}_{}", pair[0], pair[1]))
            .collect();

        let mut tokens = unigrams;
        tokens.extend(bigrams);
        tokens
    }

    /// Get the name of this tokenizer (for debugging and configuration).
    pub fn name(&self) -> &'static str {
        "feed_text"
    }
}

impl Default for TextTokenizer {
    fn default() -> Self {
        Self::new().expect("Default strip pattern should be valid")
    }
}
