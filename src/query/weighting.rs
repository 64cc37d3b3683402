//! Weighting strategies that turn term statistics into relevance scores.
//!
//! A [`Weighting`] is the only pluggable piece of query evaluation: leaf
//! matchers hand it the corpus-level [`TermStats`] of their term together with
//! the per-document [`DocStats`] and use whatever number comes back as the
//! document's weight. Combining weights (sums for `And`/`Or`) is done by the
//! matchers themselves.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::index::DocNum;

/// Corpus-level statistics of one term, fixed for a matcher's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct TermStats {
    /// Number of live documents containing the term in the field.
    pub doc_freq: u64,
    /// Number of live documents in the index.
    pub doc_count: u64,
    /// Average length of the field across documents that have it.
    pub avg_field_length: f64,
    /// Query-time boost.
    pub boost: f64,
}

/// Statistics of one term at one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocStats {
    /// The document being scored.
    pub doc_id: DocNum,
    /// Occurrences of the term in the document's field.
    pub term_freq: u64,
    /// Length of the document's field.
    pub field_length: f64,
}

/// Trait for scoring functions.
pub trait Weighting: Send + Sync + Debug {
    /// Score a term occurrence at a document.
    fn score(&self, term: &TermStats, doc: &DocStats) -> f64;

    /// Score given to documents matched by an `Every` query.
    fn every_score(&self) -> f64 {
        1.0
    }

    /// Get the name of this weighting.
    fn name(&self) -> &'static str;
}

/// Scores a document by the raw number of term occurrences.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frequency;

impl Weighting for Frequency {
    fn score(&self, term: &TermStats, doc: &DocStats) -> f64 {
        doc.term_freq as f64 * term.boost
    }

    fn name(&self) -> &'static str {
        "Frequency"
    }
}

/// BM25 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Config {
    /// Term frequency saturation.
    pub k1: f64,
    /// Field length normalization strength, in `[0, 1]`.
    pub b: f64,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Bm25Config { k1: 1.2, b: 0.75 }
    }
}

/// Okapi BM25 weighting.
///
/// Uses the non-negative IDF variant `ln(1 + (N - df + 0.5) / (df + 0.5))`, so
/// every document containing the term at least once gets a strictly positive
/// score, even for terms present in every document.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bm25 {
    config: Bm25Config,
}

impl Bm25 {
    /// Create a BM25 weighting with default parameters.
    pub fn new() -> Self {
        Bm25::default()
    }

    /// Create a BM25 weighting with custom parameters.
    pub fn with_config(config: Bm25Config) -> Self {
        Bm25 { config }
    }

    /// Get the k1 parameter.
    pub fn k1(&self) -> f64 {
        self.config.k1
    }

    /// Get the b parameter.
    pub fn b(&self) -> f64 {
        self.config.b
    }

    /// Calculate the IDF (Inverse Document Frequency) component.
    fn idf(&self, doc_freq: u64, doc_count: u64) -> f64 {
        let n = doc_count.max(doc_freq) as f64;
        let df = doc_freq as f64;

        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Calculate the TF (Term Frequency) component.
    fn tf(&self, term_freq: f64, field_length: f64, avg_field_length: f64) -> f64 {
        if term_freq == 0.0 {
            return 0.0;
        }

        let norm_factor = if avg_field_length > 0.0 {
            1.0 - self.config.b + self.config.b * (field_length / avg_field_length)
        } else {
            1.0
        };

        (term_freq * (self.config.k1 + 1.0)) / (term_freq + self.config.k1 * norm_factor)
    }
}

impl Weighting for Bm25 {
    fn score(&self, term: &TermStats, doc: &DocStats) -> f64 {
        let idf = self.idf(term.doc_freq, term.doc_count);
        let tf = self.tf(doc.term_freq as f64, doc.field_length, term.avg_field_length);

        term.boost * idf * tf
    }

    fn name(&self) -> &'static str {
        "BM25"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term_stats(doc_freq: u64, doc_count: u64) -> TermStats {
        TermStats {
            doc_freq,
            doc_count,
            avg_field_length: 10.0,
            boost: 1.0,
        }
    }

    fn doc_stats(term_freq: u64, field_length: f64) -> DocStats {
        DocStats {
            doc_id: 0,
            term_freq,
            field_length,
        }
    }

    #[test]
    fn test_frequency_weighting() {
        let weighting = Frequency;
        assert_eq!(weighting.score(&term_stats(3, 10), &doc_stats(4, 10.0)), 4.0);

        let boosted = TermStats {
            boost: 2.5,
            ..term_stats(3, 10)
        };
        assert_eq!(weighting.score(&boosted, &doc_stats(2, 10.0)), 5.0);
        assert_eq!(weighting.every_score(), 1.0);
        assert_eq!(weighting.name(), "Frequency");
    }

    #[test]
    fn test_bm25_monotonic_in_term_frequency() {
        let weighting = Bm25::new();
        let stats = term_stats(10, 1000);

        let mut previous = 0.0;
        for tf in 1..20 {
            let score = weighting.score(&stats, &doc_stats(tf, 10.0));
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_bm25_positive_for_ubiquitous_terms() {
        let weighting = Bm25::new();

        // The term appears in every document
        let score = weighting.score(&term_stats(2, 2), &doc_stats(1, 10.0));
        assert!(score > 0.0);
        assert!(score.is_finite());
        assert_ne!(score, 1.0);
    }

    #[test]
    fn test_bm25_length_normalization() {
        let weighting = Bm25::new();
        let stats = term_stats(5, 100);

        let short = weighting.score(&stats, &doc_stats(1, 5.0));
        let long = weighting.score(&stats, &doc_stats(1, 20.0));
        assert!(short > long);

        // b = 0 disables length normalization
        let flat = Bm25::with_config(Bm25Config { k1: 1.2, b: 0.0 });
        assert_eq!(
            flat.score(&stats, &doc_stats(1, 5.0)),
            flat.score(&stats, &doc_stats(1, 20.0))
        );
    }

    #[test]
    fn test_bm25_rarer_terms_score_higher() {
        let weighting = Bm25::new();

        let rare = weighting.score(&term_stats(1, 100), &doc_stats(1, 10.0));
        let common = weighting.score(&term_stats(90, 100), &doc_stats(1, 10.0));
        assert!(rare > common);
    }

    #[test]
    fn test_bm25_zero_term_frequency() {
        let weighting = Bm25::new();
        assert_eq!(weighting.score(&term_stats(1, 10), &doc_stats(0, 10.0)), 0.0);
        assert_eq!(weighting.k1(), 1.2);
        assert_eq!(weighting.b(), 0.75);
    }
}
