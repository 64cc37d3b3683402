//! Search results and result pages.

use std::sync::Arc;

use log::{debug, trace};

use crate::document::StoredFields;
use crate::error::{PennantError, Result};
use crate::index::{DocNum, IndexReader};
use crate::query::Query;
use crate::query::collector::{self, Collected};
pub use crate::query::collector::ScoredHit;
use crate::query::matcher::Matcher;
use crate::query::weighting::Weighting;
use crate::search::key_terms::{self, KeyTerms};

/// The ranked outcome of a search.
///
/// Holds the best-scoring hits in ranking order (descending score, ties by
/// ascending document number) and the total number of matching documents,
/// which may exceed the number of hits retained.
#[derive(Debug, Clone)]
pub struct Results {
    query: Query,
    top_n: Vec<ScoredHit>,
    total: u64,
    reader: Arc<dyn IndexReader>,
    weighting: Arc<dyn Weighting>,
}

impl Results {
    pub(crate) fn new(
        query: Query,
        collected: Collected,
        reader: Arc<dyn IndexReader>,
        weighting: Arc<dyn Weighting>,
    ) -> Self {
        Results {
            query,
            top_n: collected.hits,
            total: collected.total,
            reader,
            weighting,
        }
    }

    /// The query these results answer.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Total number of matching documents.
    pub fn len(&self) -> usize {
        self.total as usize
    }

    /// Check if no document matched.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of hits retained with scores.
    pub fn scored(&self) -> usize {
        self.top_n.len()
    }

    /// The retained hits in ranking order.
    pub fn top_n(&self) -> &[ScoredHit] {
        &self.top_n
    }

    /// The retained hits, mutable.
    pub fn top_n_mut(&mut self) -> &mut [ScoredHit] {
        &mut self.top_n
    }

    /// Iterate over the retained hits.
    pub fn iter(&self) -> std::slice::Iter<'_, ScoredHit> {
        self.top_n.iter()
    }

    /// Document numbers of the retained hits, in ranking order.
    pub fn docnums(&self) -> Vec<DocNum> {
        self.top_n.iter().map(|hit| hit.doc_id).collect()
    }

    fn hit(&self, rank: usize) -> Result<&ScoredHit> {
        self.top_n.get(rank).ok_or_else(|| {
            PennantError::invalid_argument(format!(
                "Rank {rank} out of range ({} scored hits)",
                self.top_n.len()
            ))
        })
    }

    /// Score of the hit at `rank`.
    pub fn score(&self, rank: usize) -> Result<f64> {
        Ok(self.hit(rank)?.score)
    }

    /// Document number of the hit at `rank`.
    pub fn docnum(&self, rank: usize) -> Result<DocNum> {
        Ok(self.hit(rank)?.doc_id)
    }

    /// Stored fields of the hit at `rank`.
    pub fn document(&self, rank: usize) -> Result<StoredFields> {
        let doc_id = self.docnum(rank)?;
        self.reader.stored_fields(doc_id)
    }

    /// Stored fields of every retained hit, in ranking order.
    pub fn documents(&self) -> impl Iterator<Item = Result<StoredFields>> + '_ {
        self.top_n
            .iter()
            .map(|hit| self.reader.stored_fields(hit.doc_id))
    }

    /// An independent copy of these results.
    pub fn copy(&self) -> Results {
        self.clone()
    }

    /// The index snapshot these results were computed on.
    pub fn reader(&self) -> &Arc<dyn IndexReader> {
        &self.reader
    }

    /// The weighting these results were scored with.
    pub fn weighting(&self) -> &Arc<dyn Weighting> {
        &self.weighting
    }

    /// A fresh matcher for the query these results answer.
    pub fn matcher(&self) -> Result<Matcher> {
        Matcher::build(&self.query, &self.reader, &self.weighting)
    }

    /// Re-run the query, retaining up to `limit` hits.
    fn recollect(&mut self, limit: usize) -> Result<()> {
        trace!(
            "Re-collecting '{}' with limit {limit} ({} of {} hits materialized)",
            self.query,
            self.top_n.len(),
            self.total
        );
        let collected = collector::collect(self.matcher()?, Some(limit))?;
        self.top_n = collected.hits;
        self.total = collected.total;
        Ok(())
    }

    /// Get page `pagenum` (1-based) of `pagelen` hits each.
    ///
    /// Hits beyond those materialized are collected on demand, so any page up
    /// to the page count can be requested regardless of the original limit.
    pub fn page(&mut self, pagenum: usize, pagelen: usize) -> Result<ResultsPage> {
        if pagenum == 0 {
            return Err(PennantError::invalid_argument("Page numbers start at 1"));
        }
        if pagelen == 0 {
            return Err(PennantError::invalid_argument(
                "Page length must be greater than zero",
            ));
        }

        let total = self.len();
        let pagecount = total.div_ceil(pagelen).max(1);
        if pagenum > pagecount {
            return Err(PennantError::invalid_argument(format!(
                "Page {pagenum} out of range ({pagecount} pages)"
            )));
        }

        let offset = (pagenum - 1) * pagelen;
        let wanted = pagenum.saturating_mul(pagelen);
        if wanted > self.top_n.len() && self.top_n.len() < total {
            self.recollect(wanted)?;
        }

        let end = wanted.min(self.top_n.len());
        let hits = self.top_n[offset.min(end)..end].to_vec();
        debug!(
            "Page {pagenum}/{pagecount} of '{}': {} hits at offset {offset}",
            self.query,
            hits.len()
        );

        Ok(ResultsPage {
            pagelen: hits.len(),
            hits,
            total,
            pagenum,
            pagecount,
            offset,
            reader: Arc::clone(&self.reader),
        })
    }

    /// Key terms of `field` over `subset`, or over the retained hits when
    /// `subset` is `None`.
    pub fn key_terms(&self, field: &str, subset: Option<&[DocNum]>) -> Result<KeyTerms> {
        match subset {
            Some(docnums) => key_terms::key_terms(self.reader.as_ref(), docnums, field),
            None => key_terms::key_terms(self.reader.as_ref(), &self.docnums(), field),
        }
    }
}

impl<'a> IntoIterator for &'a Results {
    type Item = &'a ScoredHit;
    type IntoIter = std::slice::Iter<'a, ScoredHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.top_n.iter()
    }
}

/// One page of [`Results`].
#[derive(Debug, Clone)]
pub struct ResultsPage {
    hits: Vec<ScoredHit>,
    total: usize,
    pagenum: usize,
    pagelen: usize,
    pagecount: usize,
    offset: usize,
    reader: Arc<dyn IndexReader>,
}

impl ResultsPage {
    /// Total number of matching documents across all pages.
    pub fn total(&self) -> usize {
        self.total
    }

    /// This page's number, starting at 1.
    pub fn pagenum(&self) -> usize {
        self.pagenum
    }

    /// Number of hits on this page.
    pub fn pagelen(&self) -> usize {
        self.pagelen
    }

    /// Number of pages.
    pub fn pagecount(&self) -> usize {
        self.pagecount
    }

    /// Rank of this page's first hit within the full results.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Check if this is the last page.
    pub fn is_last_page(&self) -> bool {
        self.pagenum == self.pagecount
    }

    /// Number of hits on this page.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Check if this page has no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// The page's hits in ranking order.
    pub fn hits(&self) -> &[ScoredHit] {
        &self.hits
    }

    /// Iterate over the page's hits.
    pub fn iter(&self) -> std::slice::Iter<'_, ScoredHit> {
        self.hits.iter()
    }

    /// Score of the `index`-th hit on this page.
    pub fn score(&self, index: usize) -> Result<f64> {
        self.hits
            .get(index)
            .map(|hit| hit.score)
            .ok_or_else(|| PennantError::invalid_argument(format!("No hit {index} on this page")))
    }

    /// Stored fields of the `index`-th hit on this page.
    pub fn document(&self, index: usize) -> Result<StoredFields> {
        let hit = self
            .hits
            .get(index)
            .ok_or_else(|| PennantError::invalid_argument(format!("No hit {index} on this page")))?;
        self.reader.stored_fields(hit.doc_id)
    }

    /// Stored fields of every hit on this page.
    pub fn documents(&self) -> impl Iterator<Item = Result<StoredFields>> + '_ {
        self.hits
            .iter()
            .map(|hit| self.reader.stored_fields(hit.doc_id))
    }
}
