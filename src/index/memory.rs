//! In-memory index implementation.
//!
//! [`MemoryIndexWriter`] accumulates analyzed documents and deletions;
//! [`MemoryIndexWriter::commit`] freezes the current state into an immutable
//! [`MemoryIndex`] snapshot. Later additions or deletions never affect a
//! snapshot that was already handed out, and document numbers are never
//! reused, so deleted documents leave gaps.

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashMap;
use log::debug;

use crate::analysis::Token;
use crate::document::{Document, StoredFields};
use crate::error::{PennantError, Result};
use crate::index::{DocNum, FieldStats, IndexReader, NO_MORE_DOCS, PostingIterator, TermVector};
use crate::schema::Schema;

/// A single posting in a posting list.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    /// Document ID.
    pub doc_id: DocNum,
    /// Term frequency in the document.
    pub frequency: u32,
    /// Positions of the term in the document (empty if the field keeps none).
    pub positions: Vec<u32>,
    /// Byte range of each position in the original field text.
    pub offsets: Vec<(usize, usize)>,
}

impl Posting {
    /// Create a posting with frequency.
    pub fn with_frequency(doc_id: DocNum, frequency: u32) -> Self {
        Posting {
            doc_id,
            frequency,
            positions: Vec::new(),
            offsets: Vec::new(),
        }
    }

    /// Create a posting with positions.
    pub fn with_positions(doc_id: DocNum, positions: Vec<u32>) -> Self {
        let frequency = positions.len() as u32;
        Posting {
            doc_id,
            frequency,
            positions,
            offsets: Vec::new(),
        }
    }

    /// Attach byte offsets, one per position.
    pub fn with_offsets(mut self, offsets: Vec<(usize, usize)>) -> Self {
        self.offsets = offsets;
        self
    }
}

/// Posting iterator over a shared, sorted posting slice.
#[derive(Debug, Clone)]
pub struct MemoryPostingIterator {
    postings: Arc<[Posting]>,
    position: usize,
}

impl MemoryPostingIterator {
    /// Create an iterator positioned on the first posting.
    pub fn new(postings: Arc<[Posting]>) -> Self {
        MemoryPostingIterator {
            postings,
            position: 0,
        }
    }

    fn current(&self) -> Option<&Posting> {
        self.postings.get(self.position)
    }
}

impl PostingIterator for MemoryPostingIterator {
    fn doc_id(&self) -> DocNum {
        self.current().map(|p| p.doc_id).unwrap_or(NO_MORE_DOCS)
    }

    fn term_freq(&self) -> u64 {
        self.current().map(|p| p.frequency as u64).unwrap_or(0)
    }

    fn positions(&self) -> Result<Vec<u32>> {
        Ok(self
            .current()
            .map(|p| p.positions.clone())
            .unwrap_or_default())
    }

    fn offsets(&self) -> Result<Vec<(usize, usize)>> {
        Ok(self
            .current()
            .map(|p| p.offsets.clone())
            .unwrap_or_default())
    }

    fn next(&mut self) -> Result<bool> {
        if self.position < self.postings.len() {
            self.position += 1;
        }
        Ok(self.position < self.postings.len())
    }

    fn skip_to(&mut self, target: DocNum) -> Result<bool> {
        if self.position >= self.postings.len() {
            return Ok(false);
        }
        if self.postings[self.position].doc_id >= target {
            return Ok(true);
        }

        // Postings are sorted, so the remaining tail can be binary searched.
        let remaining = &self.postings[self.position..];
        self.position += remaining.partition_point(|p| p.doc_id < target);
        Ok(self.position < self.postings.len())
    }

    fn cost(&self) -> u64 {
        self.postings.len() as u64
    }
}

/// Indexed data of one field.
#[derive(Debug, Default)]
struct FieldData {
    terms: AHashMap<String, Arc<[Posting]>>,
    /// Documents with at least one token, frequency = field length.
    docs: Arc<[Posting]>,
    lengths: AHashMap<DocNum, u64>,
    stats: FieldStats,
}

/// An immutable in-memory index snapshot.
#[derive(Debug)]
pub struct MemoryIndex {
    schema: Schema,
    fields: AHashMap<String, FieldData>,
    all_docs: Arc<[Posting]>,
    stored: Vec<StoredFields>,
    vectors: Vec<AHashMap<String, TermVector>>,
    deleted: Vec<bool>,
    live_count: u64,
}

impl MemoryIndex {
    fn field_data(&self, field: &str) -> Result<Option<&FieldData>> {
        self.schema.require_field(field)?;
        Ok(self.fields.get(field))
    }

    fn check_doc(&self, doc_id: DocNum) -> Result<usize> {
        if doc_id >= self.max_doc() {
            return Err(PennantError::invalid_argument(format!(
                "Document {doc_id} out of range (max_doc = {})",
                self.max_doc()
            )));
        }
        if self.is_deleted(doc_id) {
            return Err(PennantError::index(format!("Document {doc_id} is deleted")));
        }
        Ok(doc_id as usize)
    }
}

impl IndexReader for MemoryIndex {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn doc_count(&self) -> u64 {
        self.live_count
    }

    fn max_doc(&self) -> DocNum {
        self.deleted.len() as DocNum
    }

    fn is_deleted(&self, doc_id: DocNum) -> bool {
        self.deleted.get(doc_id as usize).copied().unwrap_or(true)
    }

    fn postings(&self, field: &str, term: &str) -> Result<Option<Box<dyn PostingIterator>>> {
        Ok(self
            .field_data(field)?
            .and_then(|data| data.terms.get(term))
            .map(|postings| {
                Box::new(MemoryPostingIterator::new(postings.clone())) as Box<dyn PostingIterator>
            }))
    }

    fn all_documents(&self, field: Option<&str>) -> Result<Box<dyn PostingIterator>> {
        let postings = match field {
            Some(field) => match self.field_data(field)? {
                Some(data) => data.docs.clone(),
                None => Arc::from(Vec::new()),
            },
            None => self.all_docs.clone(),
        };
        Ok(Box::new(MemoryPostingIterator::new(postings)))
    }

    fn stored_fields(&self, doc_id: DocNum) -> Result<StoredFields> {
        let index = self.check_doc(doc_id)?;
        Ok(self.stored[index].clone())
    }

    fn term_vector(&self, doc_id: DocNum, field: &str) -> Result<Option<TermVector>> {
        let field_type = self.schema.require_field(field)?;
        if !field_type.has_vectors() {
            return Ok(None);
        }
        let index = self.check_doc(doc_id)?;
        Ok(Some(
            self.vectors[index].get(field).cloned().unwrap_or_default(),
        ))
    }

    fn doc_frequency(&self, field: &str, term: &str) -> Result<u64> {
        Ok(self
            .field_data(field)?
            .and_then(|data| data.terms.get(term))
            .map(|postings| postings.len() as u64)
            .unwrap_or(0))
    }

    fn field_length(&self, doc_id: DocNum, field: &str) -> Result<u64> {
        Ok(self
            .field_data(field)?
            .and_then(|data| data.lengths.get(&doc_id).copied())
            .unwrap_or(0))
    }

    fn field_stats(&self, field: &str) -> Result<FieldStats> {
        Ok(self
            .field_data(field)?
            .map(|data| data.stats.clone())
            .unwrap_or_default())
    }
}

/// A document after analysis, as kept by the writer.
#[derive(Debug, Clone)]
struct AnalyzedDocument {
    stored: StoredFields,
    tokens: Vec<(String, Vec<Token>)>,
}

/// Accumulates documents and deletions, and commits snapshots.
#[derive(Debug)]
pub struct MemoryIndexWriter {
    schema: Schema,
    documents: Vec<AnalyzedDocument>,
    deleted: Vec<bool>,
}

impl MemoryIndexWriter {
    /// Create a writer for an empty index with the given schema.
    pub fn new(schema: Schema) -> Self {
        MemoryIndexWriter {
            schema,
            documents: Vec::new(),
            deleted: Vec::new(),
        }
    }

    /// The writer's schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Analyze and add a document, returning its document number.
    pub fn add_document(&mut self, document: Document) -> Result<DocNum> {
        let mut stored = StoredFields::new();
        let mut tokens = Vec::new();

        // Iterate in schema order so indexing does not depend on hash order.
        for name in document.fields().keys() {
            self.schema.require_field(name)?;
        }
        for name in self.schema.field_names() {
            let Some(value) = document.get_field(name) else {
                continue;
            };
            let field_type = self.schema.require_field(name)?;
            if field_type.is_stored() {
                stored.insert(name.clone(), value.clone());
            }
            if let Some(analyzer) = field_type.analyzer() {
                tokens.push((name.clone(), analyzer.analyze(&value.index_text())));
            }
        }

        let doc_id = self.documents.len() as DocNum;
        self.documents.push(AnalyzedDocument { stored, tokens });
        self.deleted.push(false);
        Ok(doc_id)
    }

    /// Mark a document as deleted. Deleting twice is a no-op.
    pub fn delete_document(&mut self, doc_id: DocNum) -> Result<()> {
        match self.deleted.get_mut(doc_id as usize) {
            Some(flag) => {
                *flag = true;
                Ok(())
            }
            None => Err(PennantError::invalid_argument(format!(
                "Cannot delete document {doc_id}: only {} documents added",
                self.documents.len()
            ))),
        }
    }

    /// Number of live documents added so far.
    pub fn doc_count(&self) -> u64 {
        self.deleted.iter().filter(|deleted| !**deleted).count() as u64
    }

    /// Freeze the current state into an immutable snapshot.
    pub fn commit(&self) -> Result<Arc<MemoryIndex>> {
        let mut term_postings: AHashMap<String, BTreeMap<String, Vec<Posting>>> = AHashMap::new();
        let mut field_docs: AHashMap<String, Vec<Posting>> = AHashMap::new();
        let mut field_lengths: AHashMap<String, AHashMap<DocNum, u64>> = AHashMap::new();
        let mut vectors = Vec::with_capacity(self.documents.len());
        let mut all_docs = Vec::new();

        for (index, document) in self.documents.iter().enumerate() {
            let mut doc_vectors = AHashMap::new();
            if self.deleted[index] {
                vectors.push(doc_vectors);
                continue;
            }
            let doc_id = index as DocNum;
            all_docs.push(Posting::with_frequency(doc_id, 1));

            for (field, tokens) in &document.tokens {
                if tokens.is_empty() {
                    continue;
                }
                let field_type = self.schema.require_field(field)?;

                let mut grouped: BTreeMap<&str, Vec<&Token>> = BTreeMap::new();
                for token in tokens {
                    grouped.entry(token.text.as_str()).or_default().push(token);
                }

                let terms = term_postings.entry(field.clone()).or_default();
                for (term, occurrences) in &grouped {
                    let posting = if field_type.has_positions() {
                        let positions = occurrences.iter().map(|t| t.position).collect();
                        let offsets = occurrences
                            .iter()
                            .map(|t| (t.start_offset, t.end_offset))
                            .collect();
                        Posting::with_positions(doc_id, positions).with_offsets(offsets)
                    } else {
                        Posting::with_frequency(doc_id, occurrences.len() as u32)
                    };
                    terms.entry(term.to_string()).or_default().push(posting);
                }

                if field_type.has_vectors() {
                    let vector: TermVector = grouped
                        .iter()
                        .map(|(term, occurrences)| (term.to_string(), occurrences.len() as u64))
                        .collect();
                    doc_vectors.insert(field.clone(), vector);
                }

                let length = tokens.len() as u64;
                field_docs
                    .entry(field.clone())
                    .or_default()
                    .push(Posting::with_frequency(doc_id, length as u32));
                field_lengths
                    .entry(field.clone())
                    .or_default()
                    .insert(doc_id, length);
            }
            vectors.push(doc_vectors);
        }

        let mut fields = AHashMap::new();
        for (field, docs) in field_docs {
            let lengths = field_lengths.remove(&field).unwrap_or_default();
            let stats = FieldStats {
                doc_count: docs.len() as u64,
                total_terms: lengths.values().sum(),
            };
            let terms = term_postings
                .remove(&field)
                .unwrap_or_default()
                .into_iter()
                .map(|(term, postings)| (term, Arc::from(postings)))
                .collect();
            fields.insert(
                field,
                FieldData {
                    terms,
                    docs: Arc::from(docs),
                    lengths,
                    stats,
                },
            );
        }

        let live_count = all_docs.len() as u64;
        debug!(
            "committed in-memory snapshot: {} live documents, {} indexed fields",
            live_count,
            fields.len()
        );

        Ok(Arc::new(MemoryIndex {
            schema: self.schema.clone(),
            fields,
            all_docs: Arc::from(all_docs),
            stored: self.documents.iter().map(|d| d.stored.clone()).collect(),
            vectors,
            deleted: self.deleted.clone(),
            live_count,
        }))
    }
}
