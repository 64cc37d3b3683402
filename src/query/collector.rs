//! Collector implementations for gathering search results.
//!
//! Collection is a single pass over a [`Matcher`]: every match is counted,
//! and depending on the collector it is also retained.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::{PennantError, Result};
use crate::index::DocNum;
use crate::query::matcher::Matcher;

/// A matched document with its relevance score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredHit {
    /// Document number.
    pub doc_id: DocNum,
    /// Relevance score.
    pub score: f64,
}

impl ScoredHit {
    /// Create a new hit.
    pub fn new(doc_id: DocNum, score: f64) -> Self {
        ScoredHit { doc_id, score }
    }
}

/// Ranking order: descending score, ties broken by ascending document number.
pub fn rank_order(a: &ScoredHit, b: &ScoredHit) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.doc_id.cmp(&b.doc_id))
}

/// Trait for collecting search results.
pub trait Collector: Send + Debug {
    /// Whether `collect` needs real scores. Matchers skip weighting otherwise.
    fn needs_score(&self) -> bool {
        true
    }

    /// Collect a document hit.
    fn collect(&mut self, doc_id: DocNum, score: f64) -> Result<()>;

    /// Get the total number of hits seen.
    fn total_hits(&self) -> u64;

    /// Get the number of hits retained.
    fn scored(&self) -> usize;

    /// Consume the collector, returning retained hits in ranking order.
    fn into_hits(self) -> Vec<ScoredHit>
    where
        Self: Sized;
}

/// A hit in the bounded heap; the worst hit compares greatest.
#[derive(Debug, Clone, Copy)]
struct HeapHit(ScoredHit);

impl PartialEq for HeapHit {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapHit {}

impl PartialOrd for HeapHit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapHit {
    fn cmp(&self, other: &Self) -> Ordering {
        rank_order(&self.0, &other.0)
    }
}

/// A collector that keeps the top N documents by score.
#[derive(Debug)]
pub struct TopDocsCollector {
    max_docs: usize,
    /// Max-heap on rank position, so the worst retained hit is on top.
    hits: BinaryHeap<HeapHit>,
    total_hits: u64,
}

impl TopDocsCollector {
    /// Create a new top docs collector.
    pub fn new(max_docs: usize) -> Self {
        TopDocsCollector {
            max_docs,
            hits: BinaryHeap::with_capacity(max_docs.min(1024)),
            total_hits: 0,
        }
    }

    /// Get the maximum number of documents to collect.
    pub fn max_docs(&self) -> usize {
        self.max_docs
    }

    /// Score a new hit must beat to be retained, once the heap is full.
    pub fn current_min_score(&self) -> Option<f64> {
        if self.hits.len() < self.max_docs {
            None
        } else {
            self.hits.peek().map(|hit| hit.0.score)
        }
    }
}

impl Collector for TopDocsCollector {
    fn collect(&mut self, doc_id: DocNum, score: f64) -> Result<()> {
        self.total_hits += 1;
        let hit = HeapHit(ScoredHit::new(doc_id, score));

        if self.hits.len() < self.max_docs {
            self.hits.push(hit);
        } else if let Some(mut worst) = self.hits.peek_mut()
            && hit < *worst
        {
            *worst = hit;
        }

        Ok(())
    }

    fn total_hits(&self) -> u64 {
        self.total_hits
    }

    fn scored(&self) -> usize {
        self.hits.len()
    }

    fn into_hits(self) -> Vec<ScoredHit> {
        self.hits
            .into_sorted_vec()
            .into_iter()
            .map(|hit| hit.0)
            .collect()
    }
}

/// A collector that just counts the number of matching documents.
#[derive(Debug, Default)]
pub struct CountCollector {
    count: u64,
}

impl CountCollector {
    /// Create a new count collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current count.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Collector for CountCollector {
    fn needs_score(&self) -> bool {
        false
    }

    fn collect(&mut self, _doc_id: DocNum, _score: f64) -> Result<()> {
        self.count += 1;
        Ok(())
    }

    fn total_hits(&self) -> u64 {
        self.count
    }

    fn scored(&self) -> usize {
        0
    }

    fn into_hits(self) -> Vec<ScoredHit> {
        Vec::new()
    }
}

/// A collector that collects all matching documents.
#[derive(Debug, Default)]
pub struct AllDocsCollector {
    hits: Vec<ScoredHit>,
}

impl AllDocsCollector {
    /// Create a new all docs collector.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Collector for AllDocsCollector {
    fn collect(&mut self, doc_id: DocNum, score: f64) -> Result<()> {
        self.hits.push(ScoredHit::new(doc_id, score));
        Ok(())
    }

    fn total_hits(&self) -> u64 {
        self.hits.len() as u64
    }

    fn scored(&self) -> usize {
        self.hits.len()
    }

    fn into_hits(mut self) -> Vec<ScoredHit> {
        self.hits.sort_by(rank_order);
        self.hits
    }
}

/// Feed every remaining match of `matcher` to `collector`.
pub fn run<C: Collector>(matcher: &mut Matcher, collector: &mut C) -> Result<()> {
    let needs_score = collector.needs_score();
    while matcher.is_active() {
        let score = if needs_score { matcher.weight()? } else { 0.0 };
        collector.collect(matcher.doc_id(), score)?;
        matcher.next()?;
    }
    Ok(())
}

/// Hits retained by [`collect`] together with the number of matches seen.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected {
    /// Retained hits in ranking order.
    pub hits: Vec<ScoredHit>,
    /// Number of matching documents.
    pub total: u64,
}

/// Collect the matches of `matcher`, retaining the best `limit` of them, or
/// all of them when `limit` is `None`.
pub fn collect(mut matcher: Matcher, limit: Option<usize>) -> Result<Collected> {
    match limit {
        Some(0) => Err(PennantError::invalid_argument(
            "Result limit must be greater than zero",
        )),
        Some(limit) => {
            let mut collector = TopDocsCollector::new(limit);
            run(&mut matcher, &mut collector)?;
            let total = collector.total_hits();
            trace!("Collected top {} of {total} matches", collector.scored());
            Ok(Collected {
                hits: collector.into_hits(),
                total,
            })
        }
        None => {
            let mut collector = AllDocsCollector::new();
            run(&mut matcher, &mut collector)?;
            let total = collector.total_hits();
            trace!("Collected all {total} matches");
            Ok(Collected {
                hits: collector.into_hits(),
                total,
            })
        }
    }
}

/// Count the matches of `matcher` without weighting them.
pub fn count(mut matcher: Matcher) -> Result<u64> {
    let mut collector = CountCollector::new();
    run(&mut matcher, &mut collector)?;
    Ok(collector.count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_docs_collector() {
        let mut collector = TopDocsCollector::new(3);

        collector.collect(1, 0.5).unwrap();
        collector.collect(2, 0.8).unwrap();
        collector.collect(3, 0.3).unwrap();
        collector.collect(4, 0.9).unwrap();
        collector.collect(5, 0.1).unwrap();

        assert_eq!(collector.total_hits(), 5);
        assert_eq!(collector.scored(), 3);
        assert_eq!(collector.current_min_score(), Some(0.5));

        let hits = collector.into_hits();
        let ids: Vec<DocNum> = hits.iter().map(|hit| hit.doc_id).collect();
        assert_eq!(ids, vec![4, 2, 1]);
    }

    #[test]
    fn test_top_docs_ties_prefer_lower_doc_ids() {
        let mut collector = TopDocsCollector::new(2);
        for doc_id in [7, 3, 9, 1] {
            collector.collect(doc_id, 1.0).unwrap();
        }

        let ids: Vec<DocNum> = collector.into_hits().iter().map(|hit| hit.doc_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_count_collector() {
        let mut collector = CountCollector::new();
        assert!(!collector.needs_score());

        collector.collect(1, 0.0).unwrap();
        collector.collect(2, 0.0).unwrap();

        assert_eq!(collector.count(), 2);
        assert_eq!(collector.total_hits(), 2);
        assert!(collector.into_hits().is_empty());
    }

    #[test]
    fn test_all_docs_collector() {
        let mut collector = AllDocsCollector::new();
        collector.collect(2, 0.5).unwrap();
        collector.collect(0, 0.5).unwrap();
        collector.collect(1, 2.0).unwrap();

        assert_eq!(collector.scored(), 3);
        let hits = collector.into_hits();
        assert_eq!(
            hits,
            vec![
                ScoredHit::new(1, 2.0),
                ScoredHit::new(0, 0.5),
                ScoredHit::new(2, 0.5)
            ]
        );
    }

    #[test]
    fn test_collect_rejects_zero_limit() {
        let result = collect(Matcher::Empty, Some(0));
        assert!(result.unwrap_err().is_invalid_argument());

        let collected = collect(Matcher::Empty, Some(5)).unwrap();
        assert_eq!(collected.total, 0);
        assert!(collected.hits.is_empty());
        assert_eq!(count(Matcher::Empty).unwrap(), 0);
    }
}
