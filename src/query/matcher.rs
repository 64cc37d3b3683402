//! Matcher implementations for query execution.
//!
//! A [`Matcher`] is a cursor over the documents matching one query node. It
//! starts positioned on its first match (or exhausted), moves forward with
//! [`Matcher::next`] and [`Matcher::skip_to`], and reports the weight and the
//! spans of the document it is on.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::binary_heap::PeekMut;
use std::sync::Arc;

use crate::error::Result;
use crate::index::{DocNum, IndexReader, NO_MORE_DOCS, PostingIterator};
use crate::query::Query;
use crate::query::span::{Span, SpanMatcher, SpanQuery};
use crate::query::weighting::{DocStats, TermStats, Weighting};

/// A cursor over the documents matching a query.
#[derive(Debug)]
pub enum Matcher {
    /// Matches nothing.
    Empty,
    /// Documents of one term's posting list.
    Posting(PostingMatcher),
    /// Every document, or every document with a value in a field.
    Every(EveryMatcher),
    /// Intersection of child matchers.
    Conjunction(ConjunctionMatcher),
    /// Union of child matchers.
    Disjunction(DisjunctionMatcher),
    /// Documents of one matcher absent from another.
    ConjunctionNot(ConjunctionNotMatcher),
    /// Documents with positional spans.
    Span(SpanMatcher),
}

impl Matcher {
    /// Build a matcher for `query`, positioned on its first match.
    ///
    /// Every field referenced by the query must be declared in the reader's
    /// schema; otherwise an `UnknownField` error is returned.
    pub fn build(
        query: &Query,
        reader: &Arc<dyn IndexReader>,
        weighting: &Arc<dyn Weighting>,
    ) -> Result<Matcher> {
        let matcher = match query {
            Query::Term { field, text, boost } => {
                match PostingMatcher::open(reader, weighting, field, text, *boost)? {
                    Some(postings) => Matcher::Posting(postings),
                    None => Matcher::Empty,
                }
            }
            Query::Every { field } => {
                if let Some(field) = field {
                    reader.schema().require_field(field)?;
                }
                let postings = reader.all_documents(field.as_deref())?;
                Matcher::Every(EveryMatcher::new(postings, weighting.every_score()))
            }
            Query::And(children) => {
                let mut matchers = Self::build_all(children, reader, weighting)?;
                match matchers.len() {
                    0 => Matcher::Empty,
                    1 => matchers.remove(0),
                    _ => Matcher::Conjunction(ConjunctionMatcher::new(matchers)?),
                }
            }
            Query::Or(children) => {
                let mut matchers = Self::build_all(children, reader, weighting)?;
                match matchers.len() {
                    0 => Matcher::Empty,
                    1 => matchers.remove(0),
                    _ => Matcher::Disjunction(DisjunctionMatcher::new(matchers)),
                }
            }
            Query::AndNot { positive, negative } => {
                let positive = Self::build(positive, reader, weighting)?;
                let negative = Self::build(negative, reader, weighting)?;
                Matcher::ConjunctionNot(ConjunctionNotMatcher::new(positive, negative)?)
            }
            Query::Phrase {
                field,
                words,
                slop,
                boost,
            } => {
                if words.is_empty() {
                    reader.schema().require_field(field)?;
                    Matcher::Empty
                } else {
                    let terms = words
                        .iter()
                        .map(|word| SpanQuery::term(field.as_str(), word.as_str()))
                        .collect();
                    let near = SpanQuery::near_with(terms, *slop, true);
                    Matcher::Span(SpanMatcher::build(&near, reader, weighting)?.with_boost(*boost))
                }
            }
            Query::Span(span) => Matcher::Span(SpanMatcher::build(span, reader, weighting)?),
        };
        Ok(matcher)
    }

    fn build_all(
        queries: &[Query],
        reader: &Arc<dyn IndexReader>,
        weighting: &Arc<dyn Weighting>,
    ) -> Result<Vec<Matcher>> {
        queries
            .iter()
            .map(|query| Self::build(query, reader, weighting))
            .collect()
    }

    /// Get the current document ID, or [`NO_MORE_DOCS`] once exhausted.
    pub fn doc_id(&self) -> DocNum {
        match self {
            Matcher::Empty => NO_MORE_DOCS,
            Matcher::Posting(m) => m.doc_id(),
            Matcher::Every(m) => m.doc_id(),
            Matcher::Conjunction(m) => m.doc_id(),
            Matcher::Disjunction(m) => m.doc_id(),
            Matcher::ConjunctionNot(m) => m.doc_id(),
            Matcher::Span(m) => m.doc_id(),
        }
    }

    /// Check if this matcher is positioned on a document.
    pub fn is_active(&self) -> bool {
        self.doc_id() != NO_MORE_DOCS
    }

    /// Move to the next matching document.
    pub fn next(&mut self) -> Result<bool> {
        match self {
            Matcher::Empty => Ok(false),
            Matcher::Posting(m) => m.next(),
            Matcher::Every(m) => m.next(),
            Matcher::Conjunction(m) => m.next(),
            Matcher::Disjunction(m) => m.next(),
            Matcher::ConjunctionNot(m) => m.next(),
            Matcher::Span(m) => m.next(),
        }
    }

    /// Skip to the first matching document >= target.
    ///
    /// A target at or before the current document leaves the matcher in place.
    pub fn skip_to(&mut self, target: DocNum) -> Result<bool> {
        match self {
            Matcher::Empty => Ok(false),
            Matcher::Posting(m) => m.skip_to(target),
            Matcher::Every(m) => m.skip_to(target),
            Matcher::Conjunction(m) => m.skip_to(target),
            Matcher::Disjunction(m) => m.skip_to(target),
            Matcher::ConjunctionNot(m) => m.skip_to(target),
            Matcher::Span(m) => m.skip_to(target),
        }
    }

    /// Relevance weight of the current document.
    pub fn weight(&self) -> Result<f64> {
        match self {
            Matcher::Empty => Ok(0.0),
            Matcher::Posting(m) => m.weight(),
            Matcher::Every(m) => Ok(m.weight()),
            Matcher::Conjunction(m) => m.weight(),
            Matcher::Disjunction(m) => m.weight(),
            Matcher::ConjunctionNot(m) => m.weight(),
            Matcher::Span(m) => m.weight(),
        }
    }

    /// Term positions (or span ranges) at the current document, sorted and
    /// deduplicated.
    pub fn spans(&self) -> Result<Vec<Span>> {
        match self {
            Matcher::Empty | Matcher::Every(_) => Ok(Vec::new()),
            Matcher::Posting(m) => m.spans(),
            Matcher::Conjunction(m) => m.spans(),
            Matcher::Disjunction(m) => m.spans(),
            Matcher::ConjunctionNot(m) => m.positive.spans(),
            Matcher::Span(m) => Ok(m.spans().to_vec()),
        }
    }

    /// Estimated number of documents this matcher visits.
    pub fn cost(&self) -> u64 {
        match self {
            Matcher::Empty => 0,
            Matcher::Posting(m) => m.cost(),
            Matcher::Every(m) => m.postings.cost(),
            Matcher::Conjunction(m) => m.cost(),
            Matcher::Disjunction(m) => m.cost,
            Matcher::ConjunctionNot(m) => m.positive.cost(),
            Matcher::Span(m) => m.cost(),
        }
    }

    /// Drain the matcher, returning the remaining matching document IDs.
    pub fn doc_ids(mut self) -> Result<Vec<DocNum>> {
        let mut ids = Vec::new();
        while self.is_active() {
            ids.push(self.doc_id());
            self.next()?;
        }
        Ok(ids)
    }
}

/// Merge span lists into one sorted, deduplicated list.
fn merge_spans(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_unstable();
    spans.dedup();
    spans
}

/// A matcher that wraps a term's posting iterator.
#[derive(Debug)]
pub struct PostingMatcher {
    postings: Box<dyn PostingIterator>,
    field: String,
    stats: TermStats,
    scorable: bool,
    reader: Arc<dyn IndexReader>,
    weighting: Arc<dyn Weighting>,
}

impl PostingMatcher {
    /// Open the posting list of `text` in `field`.
    ///
    /// Returns `None` when the term does not occur in any live document.
    pub fn open(
        reader: &Arc<dyn IndexReader>,
        weighting: &Arc<dyn Weighting>,
        field: &str,
        text: &str,
        boost: f64,
    ) -> Result<Option<Self>> {
        let scorable = reader.schema().require_field(field)?.is_scorable();
        let Some(postings) = reader.postings(field, text)? else {
            return Ok(None);
        };
        if postings.doc_id() == NO_MORE_DOCS {
            return Ok(None);
        }

        let stats = TermStats {
            doc_freq: reader.doc_frequency(field, text)?,
            doc_count: reader.doc_count(),
            avg_field_length: reader.field_stats(field)?.avg_length(),
            boost,
        };

        Ok(Some(PostingMatcher {
            postings,
            field: field.to_string(),
            stats,
            scorable,
            reader: Arc::clone(reader),
            weighting: Arc::clone(weighting),
        }))
    }

    /// Get the current document ID.
    pub fn doc_id(&self) -> DocNum {
        self.postings.doc_id()
    }

    /// Check if this matcher is positioned on a document.
    pub fn is_active(&self) -> bool {
        self.doc_id() != NO_MORE_DOCS
    }

    /// Move to the next posting.
    pub fn next(&mut self) -> Result<bool> {
        self.postings.next()
    }

    /// Skip to the first posting >= target.
    pub fn skip_to(&mut self, target: DocNum) -> Result<bool> {
        if !self.is_active() {
            return Ok(false);
        }
        if target <= self.doc_id() {
            return Ok(true);
        }
        self.postings.skip_to(target)
    }

    /// Occurrences of the term in the current document.
    pub fn term_freq(&self) -> u64 {
        self.postings.term_freq()
    }

    /// Weight of the current document according to the weighting strategy.
    ///
    /// Unscorable fields keep no lengths; they are scored as average length.
    pub fn weight(&self) -> Result<f64> {
        let doc_id = self.doc_id();
        let field_length = if self.scorable {
            self.reader.field_length(doc_id, &self.field)? as f64
        } else {
            self.stats.avg_field_length
        };
        let doc = DocStats {
            doc_id,
            term_freq: self.term_freq(),
            field_length,
        };
        Ok(self.weighting.score(&self.stats, &doc))
    }

    /// Single-position spans of the term in the current document, with byte
    /// offsets when the index recorded them.
    pub fn spans(&self) -> Result<Vec<Span>> {
        let positions = self.postings.positions()?;
        let offsets = self.postings.offsets()?;
        if offsets.len() != positions.len() {
            return Ok(positions.into_iter().map(Span::at).collect());
        }
        Ok(positions
            .into_iter()
            .zip(offsets)
            .map(|(position, (start, end))| Span::at(position).with_chars(start, end))
            .collect())
    }

    /// Number of postings.
    pub fn cost(&self) -> u64 {
        self.postings.cost()
    }
}

/// A matcher over all documents (optionally restricted to one field), each
/// weighted with a constant score.
#[derive(Debug)]
pub struct EveryMatcher {
    postings: Box<dyn PostingIterator>,
    score: f64,
}

impl EveryMatcher {
    /// Create a new every-document matcher.
    pub fn new(postings: Box<dyn PostingIterator>, score: f64) -> Self {
        EveryMatcher { postings, score }
    }

    fn doc_id(&self) -> DocNum {
        self.postings.doc_id()
    }

    fn next(&mut self) -> Result<bool> {
        self.postings.next()
    }

    fn skip_to(&mut self, target: DocNum) -> Result<bool> {
        if self.doc_id() == NO_MORE_DOCS {
            return Ok(false);
        }
        if target <= self.doc_id() {
            return Ok(true);
        }
        self.postings.skip_to(target)
    }

    fn weight(&self) -> f64 {
        self.score
    }
}

/// A matcher that implements conjunction (AND) of multiple matchers.
#[derive(Debug)]
pub struct ConjunctionMatcher {
    /// Children, cheapest first.
    matchers: Vec<Matcher>,
    current_doc: DocNum,
}

impl ConjunctionMatcher {
    /// Create a conjunction and position it on the first common document.
    pub fn new(mut matchers: Vec<Matcher>) -> Result<Self> {
        matchers.sort_by_key(|matcher| matcher.cost());
        let mut conjunction = ConjunctionMatcher {
            matchers,
            current_doc: NO_MORE_DOCS,
        };
        conjunction.advance_to_alignment()?;
        Ok(conjunction)
    }

    /// Leapfrog: skip every child to the largest current document until
    /// all of them agree.
    fn advance_to_alignment(&mut self) -> Result<bool> {
        loop {
            let mut target = 0;
            for matcher in &self.matchers {
                if !matcher.is_active() {
                    self.current_doc = NO_MORE_DOCS;
                    return Ok(false);
                }
                target = target.max(matcher.doc_id());
            }

            let mut aligned = true;
            for matcher in &mut self.matchers {
                if matcher.doc_id() < target {
                    matcher.skip_to(target)?;
                }
                if matcher.doc_id() != target {
                    aligned = false;
                }
            }

            if aligned {
                self.current_doc = target;
                return Ok(true);
            }
        }
    }

    fn doc_id(&self) -> DocNum {
        self.current_doc
    }

    fn next(&mut self) -> Result<bool> {
        if self.current_doc == NO_MORE_DOCS {
            return Ok(false);
        }
        if let Some(lead) = self.matchers.first_mut() {
            lead.next()?;
        }
        self.advance_to_alignment()
    }

    fn skip_to(&mut self, target: DocNum) -> Result<bool> {
        if self.current_doc == NO_MORE_DOCS {
            return Ok(false);
        }
        if target <= self.current_doc {
            return Ok(true);
        }
        for matcher in &mut self.matchers {
            matcher.skip_to(target)?;
        }
        self.advance_to_alignment()
    }

    fn weight(&self) -> Result<f64> {
        self.matchers.iter().map(Matcher::weight).sum()
    }

    fn spans(&self) -> Result<Vec<Span>> {
        let mut spans = Vec::new();
        for matcher in &self.matchers {
            spans.extend(matcher.spans()?);
        }
        Ok(merge_spans(spans))
    }

    fn cost(&self) -> u64 {
        self.matchers.first().map(Matcher::cost).unwrap_or(0)
    }
}

/// A helper struct for tracking matchers in the disjunction heap.
#[derive(Debug)]
struct MatcherEntry {
    /// Position of the child in the original query.
    index: usize,
    matcher: Matcher,
}

impl PartialEq for MatcherEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MatcherEntry {}

impl PartialOrd for MatcherEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MatcherEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: lower doc IDs come first, then lower child indices
        other
            .matcher
            .doc_id()
            .cmp(&self.matcher.doc_id())
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// A matcher that implements disjunction (OR) of multiple matchers.
#[derive(Debug)]
pub struct DisjunctionMatcher {
    /// Min-heap of active matchers, ordered by current doc_id.
    heap: BinaryHeap<MatcherEntry>,
    current_doc: DocNum,
    cost: u64,
}

impl DisjunctionMatcher {
    /// Create a new disjunction matcher; exhausted children are dropped.
    pub fn new(matchers: Vec<Matcher>) -> Self {
        let mut heap = BinaryHeap::new();
        let mut cost = 0;

        for (index, matcher) in matchers.into_iter().enumerate() {
            if matcher.is_active() {
                cost += matcher.cost();
                heap.push(MatcherEntry { index, matcher });
            }
        }

        let mut disjunction = DisjunctionMatcher {
            heap,
            current_doc: NO_MORE_DOCS,
            cost,
        };
        disjunction.update_current();
        disjunction
    }

    fn update_current(&mut self) -> bool {
        self.current_doc = self
            .heap
            .peek()
            .map(|entry| entry.matcher.doc_id())
            .unwrap_or(NO_MORE_DOCS);
        self.current_doc != NO_MORE_DOCS
    }

    fn doc_id(&self) -> DocNum {
        self.current_doc
    }

    /// Advance every child positioned on the current document.
    fn next(&mut self) -> Result<bool> {
        if self.current_doc == NO_MORE_DOCS {
            return Ok(false);
        }

        let current_doc = self.current_doc;
        while let Some(mut top) = self.heap.peek_mut() {
            if top.matcher.doc_id() != current_doc {
                break;
            }
            if !top.matcher.next()? {
                PeekMut::pop(top);
            }
        }

        Ok(self.update_current())
    }

    fn skip_to(&mut self, target: DocNum) -> Result<bool> {
        if self.current_doc == NO_MORE_DOCS {
            return Ok(false);
        }
        if target <= self.current_doc {
            return Ok(true);
        }

        while let Some(mut top) = self.heap.peek_mut() {
            if top.matcher.doc_id() >= target {
                break;
            }
            if !top.matcher.skip_to(target)? {
                PeekMut::pop(top);
            }
        }

        Ok(self.update_current())
    }

    /// Children on the current document, in query order. Weights are summed
    /// in this order since the heap layout varies from document to document.
    fn positioned(&self) -> impl Iterator<Item = &Matcher> {
        let mut entries: Vec<&MatcherEntry> = self
            .heap
            .iter()
            .filter(|entry| entry.matcher.doc_id() == self.current_doc)
            .collect();
        entries.sort_unstable_by_key(|entry| entry.index);
        entries.into_iter().map(|entry| &entry.matcher)
    }

    fn weight(&self) -> Result<f64> {
        self.positioned().map(Matcher::weight).sum()
    }

    fn spans(&self) -> Result<Vec<Span>> {
        let mut spans = Vec::new();
        for matcher in self.positioned() {
            spans.extend(matcher.spans()?);
        }
        Ok(merge_spans(spans))
    }
}

/// A matcher for documents of `positive` that `negative` does not match.
#[derive(Debug)]
pub struct ConjunctionNotMatcher {
    positive: Box<Matcher>,
    negative: Box<Matcher>,
    current_doc: DocNum,
}

impl ConjunctionNotMatcher {
    /// Create an exclusion matcher positioned on its first match.
    pub fn new(positive: Matcher, negative: Matcher) -> Result<Self> {
        let mut matcher = ConjunctionNotMatcher {
            positive: Box::new(positive),
            negative: Box::new(negative),
            current_doc: NO_MORE_DOCS,
        };
        matcher.skip_excluded()?;
        Ok(matcher)
    }

    fn is_excluded(&mut self, doc: DocNum) -> Result<bool> {
        self.negative.skip_to(doc)?;
        Ok(self.negative.doc_id() == doc)
    }

    fn skip_excluded(&mut self) -> Result<bool> {
        while self.positive.is_active() {
            let doc = self.positive.doc_id();
            if !self.is_excluded(doc)? {
                self.current_doc = doc;
                return Ok(true);
            }
            self.positive.next()?;
        }
        self.current_doc = NO_MORE_DOCS;
        Ok(false)
    }

    fn doc_id(&self) -> DocNum {
        self.current_doc
    }

    fn next(&mut self) -> Result<bool> {
        if self.current_doc == NO_MORE_DOCS {
            return Ok(false);
        }
        self.positive.next()?;
        self.skip_excluded()
    }

    fn skip_to(&mut self, target: DocNum) -> Result<bool> {
        if self.current_doc == NO_MORE_DOCS {
            return Ok(false);
        }
        if target <= self.current_doc {
            return Ok(true);
        }
        self.positive.skip_to(target)?;
        self.skip_excluded()
    }

    fn weight(&self) -> Result<f64> {
        self.positive.weight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::error::PennantError;
    use crate::index::memory::MemoryIndexWriter;
    use crate::query::weighting::{Bm25, Frequency};
    use crate::schema::{FieldType, Schema};

    fn reader() -> Arc<dyn IndexReader> {
        let schema = Schema::new()
            .with_field("id", FieldType::id().stored(true))
            .unwrap()
            .with_field("content", FieldType::text())
            .unwrap();

        let mut writer = MemoryIndexWriter::new(schema);
        for (id, content) in [
            ("0", "alfa bravo charlie"),
            ("1", "bravo charlie delta"),
            ("2", "charlie delta echo"),
            ("3", "alfa echo alfa"),
        ] {
            writer
                .add_document(
                    Document::builder()
                        .add_text("id", id)
                        .add_text("content", content)
                        .build(),
                )
                .unwrap();
        }
        writer.commit().unwrap()
    }

    fn frequency() -> Arc<dyn Weighting> {
        Arc::new(Frequency)
    }

    fn ids(query: &Query) -> Vec<DocNum> {
        Matcher::build(query, &reader(), &frequency())
            .unwrap()
            .doc_ids()
            .unwrap()
    }

    #[test]
    fn test_term_matcher() {
        assert_eq!(ids(&Query::term("content", "alfa")), vec![0, 3]);
        assert_eq!(ids(&Query::term("content", "zulu")), Vec::<DocNum>::new());

        let matcher = Matcher::build(&Query::term("content", "alfa"), &reader(), &frequency())
            .unwrap();
        assert!(matches!(matcher, Matcher::Posting(_)));
        assert_eq!(matcher.weight().unwrap(), 1.0);
        assert_eq!(matcher.spans().unwrap(), vec![Span::at(0)]);
    }

    #[test]
    fn test_unknown_field() {
        let result = Matcher::build(&Query::term("color", "red"), &reader(), &frequency());
        assert!(matches!(result, Err(PennantError::UnknownField(_))));

        let nested = Query::or(vec![Query::term("content", "alfa"), Query::every("color")]);
        assert!(Matcher::build(&nested, &reader(), &frequency()).is_err());
    }

    #[test]
    fn test_conjunction_and_disjunction() {
        let and = Query::and(vec![
            Query::term("content", "charlie"),
            Query::term("content", "delta"),
        ]);
        assert_eq!(ids(&and), vec![1, 2]);

        let or = Query::or(vec![
            Query::term("content", "alfa"),
            Query::term("content", "delta"),
        ]);
        assert_eq!(ids(&or), vec![0, 1, 2, 3]);

        assert_eq!(ids(&Query::and(vec![])), Vec::<DocNum>::new());
        assert_eq!(ids(&Query::or(vec![])), Vec::<DocNum>::new());

        // A missing term empties the whole intersection
        let and = Query::and(vec![Query::term("content", "alfa"), Query::term("content", "zulu")]);
        assert_eq!(ids(&and), Vec::<DocNum>::new());
    }

    #[test]
    fn test_disjunction_weight_sums_positioned_children() {
        let or = Query::or(vec![
            Query::term("content", "alfa"),
            Query::term("content", "echo"),
        ]);
        let mut matcher = Matcher::build(&or, &reader(), &frequency()).unwrap();

        assert_eq!(matcher.doc_id(), 0);
        assert_eq!(matcher.weight().unwrap(), 1.0);
        assert!(matcher.next().unwrap());
        assert_eq!(matcher.doc_id(), 2);
        assert!(matcher.next().unwrap());
        assert_eq!(matcher.doc_id(), 3);
        // alfa twice plus echo once
        assert_eq!(matcher.weight().unwrap(), 3.0);
        assert_eq!(
            matcher.spans().unwrap(),
            vec![Span::at(0), Span::at(1), Span::at(2)]
        );
        assert!(!matcher.next().unwrap());
        assert!(!matcher.is_active());
    }

    #[test]
    fn test_and_not() {
        let query = Query::and_not(Query::term("content", "charlie"), Query::term("content", "alfa"));
        assert_eq!(ids(&query), vec![1, 2]);

        let query = Query::and_not(Query::all(), Query::term("content", "zulu"));
        assert_eq!(ids(&query), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_every_matcher() {
        let matcher = Matcher::build(&Query::every("content"), &reader(), &frequency()).unwrap();
        assert_eq!(matcher.weight().unwrap(), 1.0);
        assert_eq!(matcher.doc_ids().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_skip_to() {
        let query = Query::or(vec![
            Query::term("content", "bravo"),
            Query::term("content", "echo"),
        ]);
        let mut matcher = Matcher::build(&query, &reader(), &frequency()).unwrap();

        assert!(matcher.skip_to(2).unwrap());
        assert_eq!(matcher.doc_id(), 2);
        // Backwards targets leave the matcher in place
        assert!(matcher.skip_to(1).unwrap());
        assert_eq!(matcher.doc_id(), 2);
        assert!(!matcher.skip_to(10).unwrap());
        assert_eq!(matcher.doc_id(), NO_MORE_DOCS);
    }

    #[test]
    fn test_conjunction_spans() {
        let query = Query::and(vec![
            Query::term("content", "bravo"),
            Query::term("content", "charlie"),
        ]);
        let matcher = Matcher::build(&query, &reader(), &frequency()).unwrap();
        assert_eq!(matcher.doc_id(), 0);
        assert_eq!(matcher.spans().unwrap(), vec![Span::at(1), Span::at(2)]);
    }

    #[test]
    fn test_phrase_matcher() {
        assert_eq!(ids(&Query::phrase("content", ["bravo", "charlie"])), vec![0, 1]);
        assert_eq!(ids(&Query::phrase("content", ["charlie", "bravo"])), Vec::<DocNum>::new());
        assert_eq!(
            ids(&Query::phrase("content", ["alfa", "charlie"]).with_slop(2)),
            vec![0]
        );

        // Phrases need positions
        let result = Matcher::build(&Query::phrase("id", ["0", "1"]), &reader(), &frequency());
        assert!(result.unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_bm25_weights_are_positive() {
        let weighting: Arc<dyn Weighting> = Arc::new(Bm25::new());
        let mut matcher =
            Matcher::build(&Query::term("content", "charlie"), &reader(), &weighting).unwrap();
        while matcher.is_active() {
            let weight = matcher.weight().unwrap();
            assert!(weight > 0.0 && weight.is_finite());
            matcher.next().unwrap();
        }
    }
}
