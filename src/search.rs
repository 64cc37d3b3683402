//! Search entry point.
//!
//! A [`Searcher`] pairs an index snapshot with a weighting strategy and runs
//! queries against it:
//!
//! ```
//! use pennant::document::Document;
//! use pennant::index::memory::MemoryIndexWriter;
//! use pennant::query::Query;
//! use pennant::schema::{FieldType, Schema};
//! use pennant::search::Searcher;
//!
//! let schema = Schema::new().with_field("content", FieldType::text()).unwrap();
//! let mut writer = MemoryIndexWriter::new(schema);
//! writer
//!     .add_document(Document::builder().add_text("content", "alfa bravo").build())
//!     .unwrap();
//!
//! let searcher = Searcher::new(writer.commit().unwrap());
//! let results = searcher.search(&Query::term("content", "bravo"), Some(10)).unwrap();
//! assert_eq!(results.len(), 1);
//! ```

pub mod facet;
pub mod key_terms;
pub mod results;

use std::sync::Arc;

use log::debug;
use rayon::prelude::*;

use crate::config::SearcherConfig;
use crate::document::StoredFields;
use crate::error::{PennantError, Result};
use crate::index::{DocNum, IndexReader, NO_MORE_DOCS};
use crate::query::Query;
use crate::query::collector;
use crate::query::matcher::Matcher;
use crate::query::weighting::{Bm25, Weighting};

pub use self::facet::Facets;
pub use self::key_terms::{KeyTerm, KeyTerms};
pub use self::results::{Results, ResultsPage, ScoredHit};

/// Runs queries against one index snapshot.
///
/// Cloning a searcher is cheap; clones share the snapshot and weighting.
#[derive(Debug, Clone)]
pub struct Searcher {
    reader: Arc<dyn IndexReader>,
    weighting: Arc<dyn Weighting>,
    config: SearcherConfig,
}

impl Searcher {
    /// Create a searcher with BM25 weighting and the default configuration.
    pub fn new<R: IndexReader + 'static>(reader: Arc<R>) -> Self {
        Self::from_reader(reader)
    }

    /// Create a searcher over a type-erased reader.
    pub fn from_reader(reader: Arc<dyn IndexReader>) -> Self {
        let config = SearcherConfig::default();
        Searcher {
            reader,
            weighting: Arc::new(Bm25::with_config(config.bm25)),
            config,
        }
    }

    /// Use a different weighting strategy.
    pub fn with_weighting<W: Weighting + 'static>(mut self, weighting: W) -> Self {
        self.weighting = Arc::new(weighting);
        self
    }

    /// Apply a configuration. The weighting is reset to BM25 with the
    /// configured parameters.
    pub fn with_config(mut self, config: SearcherConfig) -> Result<Self> {
        config.validate()?;
        self.weighting = Arc::new(Bm25::with_config(config.bm25));
        self.config = config;
        Ok(self)
    }

    /// The index snapshot.
    pub fn reader(&self) -> &Arc<dyn IndexReader> {
        &self.reader
    }

    /// The weighting strategy.
    pub fn weighting(&self) -> &Arc<dyn Weighting> {
        &self.weighting
    }

    /// The active configuration.
    pub fn config(&self) -> &SearcherConfig {
        &self.config
    }

    /// Build a matcher for `query` against this searcher's snapshot.
    pub fn matcher(&self, query: &Query) -> Result<Matcher> {
        Matcher::build(query, &self.reader, &self.weighting)
    }

    /// Run `query`, retaining the best `limit` hits, or every hit when `limit`
    /// is `None`. `Some(0)` is rejected.
    pub fn search(&self, query: &Query, limit: Option<usize>) -> Result<Results> {
        if limit == Some(0) {
            return Err(PennantError::invalid_argument(
                "Result limit must be greater than zero",
            ));
        }

        let matcher = self.matcher(query)?;
        let collected = collector::collect(matcher, limit)?;
        debug!(
            "Search '{query}' with {}: {} matches, {} scored",
            self.weighting.name(),
            collected.total,
            collected.hits.len()
        );

        Ok(Results::new(
            query.clone(),
            collected,
            Arc::clone(&self.reader),
            Arc::clone(&self.weighting),
        ))
    }

    /// Run `query` with the configured default limit.
    pub fn search_default(&self, query: &Query) -> Result<Results> {
        self.search(query, self.config.default_limit)
    }

    /// Run `query` and return page `pagenum` (1-based) of `pagelen` hits.
    pub fn search_page(&self, query: &Query, pagenum: usize, pagelen: usize) -> Result<ResultsPage> {
        if pagenum == 0 {
            return Err(PennantError::invalid_argument("Page numbers start at 1"));
        }
        if pagelen == 0 {
            return Err(PennantError::invalid_argument(
                "Page length must be greater than zero",
            ));
        }
        let limit = pagenum.checked_mul(pagelen).ok_or_else(|| {
            PennantError::invalid_argument(format!("Page {pagenum} of length {pagelen} is too far"))
        })?;

        let mut results = self.search(query, Some(limit))?;
        results.page(pagenum, pagelen)
    }

    /// Run `query` and return page `pagenum` with the configured page length.
    pub fn search_page_default(&self, query: &Query, pagenum: usize) -> Result<ResultsPage> {
        self.search_page(query, pagenum, self.config.default_pagelen)
    }

    /// Run independent queries in parallel. Results are in query order.
    pub fn search_batch(&self, queries: &[Query], limit: Option<usize>) -> Vec<Result<Results>> {
        debug!("Searching a batch of {} queries", queries.len());
        queries
            .par_iter()
            .map(|query| self.search(query, limit))
            .collect()
    }

    /// Key terms of `field` over the given documents.
    pub fn key_terms(&self, docnums: &[DocNum], field: &str) -> Result<KeyTerms> {
        key_terms::key_terms(self.reader.as_ref(), docnums, field)
    }

    /// The first live document whose `field` contains exactly `text`.
    pub fn document_number(&self, field: &str, text: &str) -> Result<Option<DocNum>> {
        self.reader.schema().require_field(field)?;
        Ok(self
            .reader
            .postings(field, text)?
            .map(|postings| postings.doc_id())
            .filter(|&doc_id| doc_id != NO_MORE_DOCS))
    }

    /// Stored fields of a document.
    pub fn stored_fields(&self, doc_id: DocNum) -> Result<StoredFields> {
        self.reader.stored_fields(doc_id)
    }
}
