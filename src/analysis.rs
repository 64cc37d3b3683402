//! Text analysis used when documents are indexed.
//!
//! Analysis turns a field value into a sequence of [`Token`]s carrying the
//! token position, which the index records for positional (span and phrase)
//! queries. Only a handful of fixed analyzers are provided:
//!
//! - [`SimpleAnalyzer`]: Unicode word segmentation (UAX #29) and lowercasing.
//! - [`StandardAnalyzer`]: [`SimpleAnalyzer`] plus English stop-word removal.
//! - [`KeywordAnalyzer`]: the whole value as a single token, for identifiers.
//!
//! # Examples
//!
//! ```
//! use pennant::analysis::{Analyzer, StandardAnalyzer};
//!
//! let tokens = StandardAnalyzer::new().analyze("This is some Distinctive content");
//! let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, vec!["some", "distinctive", "content"]);
//! ```

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::LazyLock;

use unicode_segmentation::UnicodeSegmentation;

/// Default English stop words list.
const DEFAULT_ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

static ENGLISH_STOP_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| DEFAULT_ENGLISH_STOP_WORDS.iter().copied().collect());

/// A token produced by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The normalized token text.
    pub text: String,
    /// Token position within the field value (0-based).
    pub position: u32,
    /// Byte offset of the first character in the original value.
    pub start_offset: usize,
    /// Byte offset one past the last character in the original value.
    pub end_offset: usize,
}

impl Token {
    /// Create a new token.
    pub fn new<S: Into<String>>(text: S, position: u32) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset: 0,
            end_offset: 0,
        }
    }

    /// Set the byte offsets of this token.
    pub fn with_offsets(mut self, start_offset: usize, end_offset: usize) -> Self {
        self.start_offset = start_offset;
        self.end_offset = end_offset;
        self
    }
}

/// Trait for analyzers that turn field text into tokens.
pub trait Analyzer: Send + Sync + Debug {
    /// Analyze the given text.
    fn analyze(&self, text: &str) -> Vec<Token>;

    /// Get the name of this analyzer.
    fn name(&self) -> &'static str;
}

/// Splits on Unicode word boundaries and lowercases every word.
#[derive(Clone, Debug, Default)]
pub struct SimpleAnalyzer;

impl SimpleAnalyzer {
    /// Create a new simple analyzer.
    pub fn new() -> Self {
        SimpleAnalyzer
    }
}

impl Analyzer for SimpleAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Token> {
        text.unicode_word_indices()
            .enumerate()
            .map(|(position, (offset, word))| {
                Token::new(word.to_lowercase(), position as u32)
                    .with_offsets(offset, offset + word.len())
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "simple"
    }
}

/// [`SimpleAnalyzer`] followed by English stop-word removal.
///
/// Positions of the surviving tokens are the positions they had before the
/// stop words were removed.
#[derive(Clone, Debug, Default)]
pub struct StandardAnalyzer {
    inner: SimpleAnalyzer,
}

impl StandardAnalyzer {
    /// Create a new standard analyzer.
    pub fn new() -> Self {
        StandardAnalyzer {
            inner: SimpleAnalyzer::new(),
        }
    }

    /// Check whether a (lowercased) word is a stop word.
    pub fn is_stop_word(word: &str) -> bool {
        ENGLISH_STOP_WORDS.contains(word)
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Token> {
        self.inner
            .analyze(text)
            .into_iter()
            .filter(|token| !Self::is_stop_word(&token.text))
            .collect()
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

/// Emits the whole (trimmed) value as a single token.
#[derive(Clone, Debug, Default)]
pub struct KeywordAnalyzer;

impl KeywordAnalyzer {
    /// Create a new keyword analyzer.
    pub fn new() -> Self {
        KeywordAnalyzer
    }
}

impl Analyzer for KeywordAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Token> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        let start = text.len() - text.trim_start().len();
        vec![Token::new(trimmed, 0).with_offsets(start, start + trimmed.len())]
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_analyzer() {
        let tokens = SimpleAnalyzer::new().analyze("Snow White, lived!");

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "snow");
        assert_eq!(tokens[1].text, "white");
        assert_eq!(tokens[1].position, 1);
        assert_eq!(tokens[2].text, "lived");
        assert_eq!(tokens[1].start_offset, 5);
        assert_eq!(tokens[1].end_offset, 10);
    }

    #[test]
    fn test_standard_analyzer_keeps_positions() {
        let tokens = StandardAnalyzer::new().analyze("the quick brown fox");

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "quick");
        assert_eq!(tokens[0].position, 1);
        assert_eq!(tokens[2].position, 3);
    }

    #[test]
    fn test_keyword_analyzer() {
        let tokens = KeywordAnalyzer::new().analyze("  Miss Mary ");
        assert_eq!(tokens, vec![Token::new("Miss Mary", 0).with_offsets(2, 11)]);

        assert!(KeywordAnalyzer::new().analyze("   ").is_empty());
    }
}
