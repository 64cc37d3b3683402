//! The index contract consumed by the retrieval core.
//!
//! Storage formats, ingestion and segment management live behind
//! [`IndexReader`]: given a field and a term it yields a [`PostingIterator`],
//! and given a document number it yields stored values or a term vector.
//! [`memory`] provides a small in-memory implementation.

pub mod memory;

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::document::StoredFields;
use crate::error::Result;
use crate::schema::Schema;

/// Identifies a document within an index snapshot.
pub type DocNum = u64;

/// Per-document term frequencies of one field, ordered by term.
pub type TermVector = BTreeMap<String, u64>;

/// Value reported by [`PostingIterator::doc_id`] once the iterator is exhausted.
pub const NO_MORE_DOCS: DocNum = u64::MAX;

/// Iterator over posting lists.
///
/// An iterator is positioned on its first posting when it is handed out, so
/// [`PostingIterator::doc_id`] is valid before the first call to
/// [`PostingIterator::next`]. Document numbers strictly increase.
pub trait PostingIterator: Send + Debug {
    /// Get the current document ID, or [`NO_MORE_DOCS`].
    fn doc_id(&self) -> DocNum;

    /// Get the term frequency in the current document.
    fn term_freq(&self) -> u64;

    /// Get the positions of the term in the current document.
    fn positions(&self) -> Result<Vec<u32>>;

    /// Get the byte range of each occurrence in the current document, in
    /// the same order as [`PostingIterator::positions`]. Empty when the
    /// field records no offsets.
    fn offsets(&self) -> Result<Vec<(usize, usize)>> {
        Ok(Vec::new())
    }

    /// Move to the next document.
    fn next(&mut self) -> Result<bool>;

    /// Skip to the first document >= target.
    fn skip_to(&mut self, target: DocNum) -> Result<bool>;

    /// Get the cost of iterating through this posting list.
    fn cost(&self) -> u64;
}

/// Statistics about a field in the index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldStats {
    /// Number of live documents with at least one term in this field.
    pub doc_count: u64,
    /// Total number of term occurrences in live documents.
    pub total_terms: u64,
}

impl FieldStats {
    /// Average field length, or 0.0 for an empty field.
    pub fn avg_length(&self) -> f64 {
        if self.doc_count == 0 {
            0.0
        } else {
            self.total_terms as f64 / self.doc_count as f64
        }
    }
}

/// Trait for read-only index snapshots.
///
/// Implementations are shared between concurrent searches and must be safe
/// for concurrent reads.
pub trait IndexReader: Send + Sync + Debug {
    /// The schema declaring this index's fields.
    fn schema(&self) -> &Schema;

    /// Get the number of live documents in the index.
    fn doc_count(&self) -> u64;

    /// One past the largest document number ever assigned.
    fn max_doc(&self) -> DocNum;

    /// Check if a document is deleted.
    fn is_deleted(&self, doc_id: DocNum) -> bool;

    /// Get the posting list for a field and term, `None` if the term is absent.
    fn postings(&self, field: &str, term: &str) -> Result<Option<Box<dyn PostingIterator>>>;

    /// Live documents having any indexed value in `field`, or all live
    /// documents when `field` is `None`. Term frequency reports the field length.
    fn all_documents(&self, field: Option<&str>) -> Result<Box<dyn PostingIterator>>;

    /// Get the stored fields of a document.
    fn stored_fields(&self, doc_id: DocNum) -> Result<StoredFields>;

    /// Get the term vector of a document's field, if the field keeps vectors.
    fn term_vector(&self, doc_id: DocNum, field: &str) -> Result<Option<TermVector>>;

    /// Number of live documents containing `term` in `field`.
    fn doc_frequency(&self, field: &str, term: &str) -> Result<u64>;

    /// Number of tokens indexed for `field` in a document.
    fn field_length(&self, doc_id: DocNum, field: &str) -> Result<u64>;

    /// Get field statistics.
    fn field_stats(&self, field: &str) -> Result<FieldStats>;

    /// Stored fields of every live document, in document order.
    fn all_stored_fields(&self) -> Result<Vec<(DocNum, StoredFields)>> {
        (0..self.max_doc())
            .filter(|&doc_id| !self.is_deleted(doc_id))
            .map(|doc_id| Ok((doc_id, self.stored_fields(doc_id)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_stats_avg_length() {
        let stats = FieldStats {
            doc_count: 4,
            total_terms: 10,
        };
        assert_eq!(stats.avg_length(), 2.5);
        assert_eq!(FieldStats::default().avg_length(), 0.0);
    }
}
