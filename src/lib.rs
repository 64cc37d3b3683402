//! # Pennant
//!
//! The retrieval core of a full-text search engine.
//!
//! ## Features
//!
//! - Closed query model: terms, boolean combinations, phrases and span queries
//! - Pluggable weighting (BM25, raw frequency)
//! - Bounded top-N collection with exact match counts
//! - Paging with on-demand re-collection
//! - Query facets (counting and categorizing)
//! - Key-term extraction from term vectors
//! - A small in-memory index for embedding and testing

pub mod analysis;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod query;
pub mod schema;
pub mod search;

pub mod prelude {
    pub use crate::config::SearcherConfig;
    pub use crate::document::{Document, FieldValue, StoredFields};
    pub use crate::error::{PennantError, Result};
    pub use crate::index::memory::{MemoryIndex, MemoryIndexWriter};
    pub use crate::index::{DocNum, IndexReader};
    pub use crate::query::weighting::{Bm25, Frequency, Weighting};
    pub use crate::query::{Query, Span, SpanQuery};
    pub use crate::schema::{FieldType, Schema};
    pub use crate::search::{Facets, Results, ResultsPage, Searcher};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
