//! Key-term extraction.
//!
//! Key terms are the words that characterise a set of documents relative to
//! the whole corpus. Each term found in the documents' term vectors is scored
//! as `subset_freq * ln(1 + N / df)`, where `subset_freq` is the term's total
//! frequency in the set, `N` the number of documents in the corpus and `df`
//! the term's document frequency.

use std::collections::BTreeSet;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{PennantError, Result};
use crate::index::{DocNum, IndexReader};

/// A term and how strongly it characterises a document set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyTerm {
    /// The term text.
    pub term: String,
    /// Significance score; higher is more characteristic.
    pub significance: f64,
}

/// Corpus-wide statistics needed to score key terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusStats {
    /// Number of live documents in the corpus.
    pub doc_count: u64,
    /// Document frequency of each term.
    pub doc_freqs: AHashMap<String, u64>,
}

impl CorpusStats {
    /// Create statistics for a corpus of `doc_count` documents.
    pub fn new(doc_count: u64) -> Self {
        CorpusStats {
            doc_count,
            doc_freqs: AHashMap::new(),
        }
    }

    /// Record the document frequency of a term.
    pub fn with_doc_freq<S: Into<String>>(mut self, term: S, doc_freq: u64) -> Self {
        self.doc_freqs.insert(term.into(), doc_freq);
        self
    }

    /// Read the document count and the document frequencies of `terms` in
    /// `field` from an index.
    pub fn gather<'a, I>(reader: &dyn IndexReader, field: &str, terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut stats = CorpusStats::new(reader.doc_count());
        for term in terms {
            let doc_freq = reader.doc_frequency(field, term)?;
            stats.doc_freqs.insert(term.to_string(), doc_freq);
        }
        Ok(stats)
    }

    /// Document frequency of a term, at least 1.
    pub fn doc_freq(&self, term: &str) -> u64 {
        self.doc_freqs.get(term).copied().unwrap_or(0).max(1)
    }
}

/// Scores subset term frequencies against corpus statistics.
#[derive(Debug, Clone)]
pub struct KeyTermExtractor {
    stats: CorpusStats,
}

impl KeyTermExtractor {
    /// Create an extractor over the given corpus statistics.
    pub fn new(stats: CorpusStats) -> Self {
        KeyTermExtractor { stats }
    }

    /// The corpus statistics used for scoring.
    pub fn stats(&self) -> &CorpusStats {
        &self.stats
    }

    /// Significance of a term occurring `subset_freq` times in the subset.
    pub fn significance(&self, term: &str, subset_freq: u64) -> f64 {
        let n = self.stats.doc_count as f64;
        let df = self.stats.doc_freq(term) as f64;
        subset_freq as f64 * (1.0 + n / df).ln()
    }

    /// Rank the terms of a subset by significance.
    pub fn extract(&self, subset_freqs: &AHashMap<String, u64>) -> KeyTerms {
        let mut terms: Vec<KeyTerm> = subset_freqs
            .iter()
            .map(|(term, &freq)| KeyTerm {
                term: term.clone(),
                significance: self.significance(term, freq),
            })
            .collect();

        terms.sort_by(|a, b| {
            b.significance
                .total_cmp(&a.significance)
                .then_with(|| a.term.cmp(&b.term))
        });

        KeyTerms {
            inner: terms.into_iter(),
        }
    }
}

/// Sum the term vectors of `field` over a set of documents.
///
/// Duplicate document numbers are counted once, and deleted documents are
/// skipped. The field must keep term vectors.
pub fn subset_frequencies(
    reader: &dyn IndexReader,
    docnums: &[DocNum],
    field: &str,
) -> Result<AHashMap<String, u64>> {
    if !reader.schema().require_field(field)?.has_vectors() {
        return Err(PennantError::invalid_argument(format!(
            "Field '{field}' does not keep term vectors"
        )));
    }

    let mut freqs = AHashMap::new();
    let unique: BTreeSet<DocNum> = docnums.iter().copied().collect();
    for doc_id in unique {
        if doc_id >= reader.max_doc() || reader.is_deleted(doc_id) {
            continue;
        }
        if let Some(vector) = reader.term_vector(doc_id, field)? {
            for (term, freq) in vector {
                *freqs.entry(term).or_insert(0) += freq;
            }
        }
    }
    Ok(freqs)
}

/// Extract the key terms of `docnums` in `field`.
pub fn key_terms(reader: &dyn IndexReader, docnums: &[DocNum], field: &str) -> Result<KeyTerms> {
    let freqs = subset_frequencies(reader, docnums, field)?;
    let stats = CorpusStats::gather(reader, field, freqs.keys().map(String::as_str))?;
    Ok(KeyTermExtractor::new(stats).extract(&freqs))
}

/// Key terms in descending order of significance.
#[derive(Debug, Clone)]
pub struct KeyTerms {
    inner: std::vec::IntoIter<KeyTerm>,
}

impl KeyTerms {
    /// Only the term texts.
    pub fn terms(self) -> impl Iterator<Item = String> {
        self.map(|key_term| key_term.term)
    }
}

impl Iterator for KeyTerms {
    type Item = KeyTerm;

    fn next(&mut self) -> Option<KeyTerm> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for KeyTerms {}

#[cfg(test)]
mod tests {
    use super::*;

    fn freqs(pairs: &[(&str, u64)]) -> AHashMap<String, u64> {
        pairs.iter().map(|(t, f)| (t.to_string(), *f)).collect()
    }

    #[test]
    fn test_rarer_terms_rank_higher() {
        let stats = CorpusStats::new(10)
            .with_doc_freq("common", 10)
            .with_doc_freq("rare", 1);
        let extractor = KeyTermExtractor::new(stats);

        let terms: Vec<String> = extractor
            .extract(&freqs(&[("common", 1), ("rare", 1)]))
            .terms()
            .collect();
        assert_eq!(terms, vec!["rare", "common"]);
    }

    #[test]
    fn test_significance_formula() {
        let extractor = KeyTermExtractor::new(CorpusStats::new(4).with_doc_freq("x", 2));
        let expected = 3.0 * (1.0f64 + 4.0 / 2.0).ln();
        assert!((extractor.significance("x", 3) - expected).abs() < 1e-12);

        // Unknown terms are treated as occurring in one document
        let expected = (1.0f64 + 4.0).ln();
        assert!((extractor.significance("y", 1) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_ties_break_alphabetically() {
        let extractor = KeyTermExtractor::new(CorpusStats::new(2));
        let terms = extractor.extract(&freqs(&[("zeta", 1), ("alpha", 1), ("mu", 1)]));
        assert_eq!(terms.len(), 3);
        assert_eq!(terms.terms().collect::<Vec<_>>(), vec!["alpha", "mu", "zeta"]);
    }
}
