//! Span queries for positional and proximity-based searching.
//!
//! A [`Span`] is a range of token positions inside one field of one document.
//! Span queries compute spans for every candidate document and match the
//! documents where at least one span survives, which makes proximity
//! (`Near`), anchoring (`First`), exclusion (`Not`), containment and ordering
//! constraints composable. Phrase queries are ordered `Near` chains.
//!
//! Spans can only be computed for fields that record positions.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PennantError, Result};
use crate::index::{DocNum, IndexReader, NO_MORE_DOCS};
use crate::query::Query;
use crate::query::matcher::{Matcher, PostingMatcher};
use crate::query::weighting::Weighting;

/// A range of token positions, both ends inclusive.
///
/// Spans read from a field that records offsets also carry the byte range
/// they cover in the field's original text. Equality, ordering and hashing
/// only look at positions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Span {
    /// First position covered.
    pub start: u32,
    /// Last position covered.
    pub end: u32,
    /// Byte offset where the first covered token starts.
    #[serde(default)]
    pub start_char: Option<usize>,
    /// Byte offset one past the end of the last covered token.
    #[serde(default)]
    pub end_char: Option<usize>,
}

impl Span {
    /// Create a new span; reversed bounds are swapped.
    pub fn new(start: u32, end: u32) -> Self {
        Span {
            start: start.min(end),
            end: start.max(end),
            start_char: None,
            end_char: None,
        }
    }

    /// A span covering a single position.
    pub fn at(position: u32) -> Self {
        Span::new(position, position)
    }

    /// Attach the byte range covered by this span.
    pub fn with_chars(mut self, start_char: usize, end_char: usize) -> Self {
        self.start_char = Some(start_char);
        self.end_char = Some(end_char);
        self
    }

    /// Number of positions covered.
    pub fn length(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Check if this span shares a position with another span.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Check if this span contains another span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Check if this span ends before another span starts.
    pub fn is_before(&self, other: &Span) -> bool {
        self.end < other.start
    }

    /// The smallest span covering both spans.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            start_char: merge_chars(self.start_char, other.start_char, usize::min),
            end_char: merge_chars(self.end_char, other.end_char, usize::max),
        }
    }
}

fn merge_chars(a: Option<usize>, b: Option<usize>, pick: fn(usize, usize) -> usize) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, b) => a.or(b),
    }
}

impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        (self.start, self.end) == (other.start, other.end)
    }
}

impl Eq for Span {}

impl PartialOrd for Span {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Span {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.start, self.end).cmp(&(other.start, other.end))
    }
}

impl Hash for Span {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.end.hash(state);
    }
}

/// A positional query tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpanQuery {
    /// Every occurrence of a term.
    Term {
        /// Field to search in.
        field: String,
        /// Exact term text.
        text: String,
    },
    /// Spans of `query` ending at or before position `limit`.
    First {
        /// Wrapped query.
        query: Box<SpanQuery>,
        /// Last allowed end position.
        limit: u32,
    },
    /// Spans of all `queries` lying within `slop` positions of each other.
    ///
    /// With more than two queries the constraint is applied left to right:
    /// each query must be near the span covering all previous ones.
    Near {
        /// Sub-queries.
        queries: Vec<SpanQuery>,
        /// Maximum distance between the end of one span and the start of the next.
        slop: u32,
        /// Whether the sub-queries must occur in the given order.
        ordered: bool,
    },
    /// Union of the spans of all sub-queries.
    Or(Vec<SpanQuery>),
    /// Spans of `include` that overlap no span of `exclude`.
    Not {
        /// Spans to keep.
        include: Box<SpanQuery>,
        /// Spans to avoid.
        exclude: Box<SpanQuery>,
    },
    /// Spans of `outer` containing at least one span of `inner`.
    Contains {
        /// Containing spans.
        outer: Box<SpanQuery>,
        /// Contained spans.
        inner: Box<SpanQuery>,
    },
    /// Spans where a span of `first` ends before a span of `second` starts,
    /// covering both.
    Before {
        /// Earlier spans.
        first: Box<SpanQuery>,
        /// Later spans.
        second: Box<SpanQuery>,
    },
    /// Spans of `query`, in documents also matching the regular `condition` query.
    Condition {
        /// Spans to report.
        query: Box<SpanQuery>,
        /// Required document-level match.
        condition: Box<Query>,
    },
}

impl SpanQuery {
    /// Create a span term query.
    pub fn term<F: Into<String>, T: Into<String>>(field: F, text: T) -> Self {
        SpanQuery::Term {
            field: field.into(),
            text: text.into(),
        }
    }

    /// Spans of `query` starting the field (ending at position 0).
    pub fn first(query: SpanQuery) -> Self {
        Self::first_within(query, 0)
    }

    /// Spans of `query` ending at or before `limit`.
    pub fn first_within(query: SpanQuery, limit: u32) -> Self {
        SpanQuery::First {
            query: Box::new(query),
            limit,
        }
    }

    /// `a` immediately followed by `b` (ordered, slop 1).
    pub fn near(a: SpanQuery, b: SpanQuery) -> Self {
        Self::near_with(vec![a, b], 1, true)
    }

    /// General proximity query.
    pub fn near_with(queries: Vec<SpanQuery>, slop: u32, ordered: bool) -> Self {
        SpanQuery::Near {
            queries,
            slop,
            ordered,
        }
    }

    /// Union of span queries.
    pub fn or(queries: Vec<SpanQuery>) -> Self {
        SpanQuery::Or(queries)
    }

    /// Spans of `include` not overlapping `exclude`.
    pub fn not(include: SpanQuery, exclude: SpanQuery) -> Self {
        SpanQuery::Not {
            include: Box::new(include),
            exclude: Box::new(exclude),
        }
    }

    /// Spans of `outer` containing `inner`.
    pub fn contains(outer: SpanQuery, inner: SpanQuery) -> Self {
        SpanQuery::Contains {
            outer: Box::new(outer),
            inner: Box::new(inner),
        }
    }

    /// `first` occurring before `second`.
    pub fn before(first: SpanQuery, second: SpanQuery) -> Self {
        SpanQuery::Before {
            first: Box::new(first),
            second: Box::new(second),
        }
    }

    /// Spans of `query` in documents matching `condition`.
    pub fn condition(query: SpanQuery, condition: Query) -> Self {
        SpanQuery::Condition {
            query: Box::new(query),
            condition: Box::new(condition),
        }
    }

    pub(crate) fn visit_fields<'a>(&'a self, visit: &mut dyn FnMut(&'a str)) {
        match self {
            SpanQuery::Term { field, .. } => visit(field),
            SpanQuery::First { query, .. } => query.visit_fields(visit),
            SpanQuery::Near { queries, .. } | SpanQuery::Or(queries) => {
                for query in queries {
                    query.visit_fields(visit);
                }
            }
            SpanQuery::Not {
                include: a,
                exclude: b,
            }
            | SpanQuery::Contains { outer: a, inner: b }
            | SpanQuery::Before {
                first: a,
                second: b,
            } => {
                a.visit_fields(visit);
                b.visit_fields(visit);
            }
            SpanQuery::Condition { query, condition } => {
                query.visit_fields(visit);
                condition.visit_fields(visit);
            }
        }
    }
}

impl fmt::Display for SpanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanQuery::Term { field, text } => write!(f, "{field}:{text}"),
            SpanQuery::First { query, limit } => write!(f, "spanFirst({query}, {limit})"),
            SpanQuery::Near {
                queries,
                slop,
                ordered,
            } => {
                write!(f, "spanNear([")?;
                for (i, query) in queries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{query}")?;
                }
                write!(f, "], {slop}, {ordered})")
            }
            SpanQuery::Or(queries) => {
                write!(f, "spanOr([")?;
                for (i, query) in queries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{query}")?;
                }
                write!(f, "])")
            }
            SpanQuery::Not { include, exclude } => write!(f, "spanNot({include}, {exclude})"),
            SpanQuery::Contains { outer, inner } => write!(f, "spanContains({outer}, {inner})"),
            SpanQuery::Before { first, second } => write!(f, "spanBefore({first}, {second})"),
            SpanQuery::Condition { query, condition } => {
                write!(f, "spanCondition({query}, {condition})")
            }
        }
    }
}

/// How a two-child span node combines its children's spans.
#[derive(Debug, Clone, Copy)]
enum PairOp {
    Near { slop: u32, ordered: bool },
    Contains,
    Before,
}

impl PairOp {
    fn combine(self, first: &[Span], second: &[Span]) -> Vec<Span> {
        let mut spans = Vec::new();
        match self {
            PairOp::Near { slop, ordered } => {
                for a in first {
                    for b in second {
                        let near = if a.is_before(b) {
                            b.start - a.end <= slop
                        } else if !ordered && b.is_before(a) {
                            a.start - b.end <= slop
                        } else {
                            false
                        };
                        if near {
                            spans.push(a.to(b));
                        }
                    }
                }
            }
            PairOp::Contains => {
                spans.extend(
                    first
                        .iter()
                        .filter(|a| second.iter().any(|b| a.contains(b)))
                        .copied(),
                );
            }
            PairOp::Before => {
                for a in first {
                    for b in second.iter().filter(|b| a.is_before(b)) {
                        spans.push(a.to(b));
                    }
                }
            }
        }
        spans.sort_unstable();
        spans.dedup();
        spans
    }
}

#[derive(Debug)]
enum SpanKind {
    Empty,
    Term(PostingMatcher),
    First {
        inner: Box<SpanMatcher>,
        limit: u32,
    },
    Pair {
        first: Box<SpanMatcher>,
        second: Box<SpanMatcher>,
        op: PairOp,
    },
    Or(Vec<SpanMatcher>),
    Not {
        include: Box<SpanMatcher>,
        exclude: Box<SpanMatcher>,
    },
    Condition {
        inner: Box<SpanMatcher>,
        condition: Box<Matcher>,
    },
}

/// Matcher over the documents where a [`SpanQuery`] produces spans.
///
/// The matcher is always positioned on a document with at least one span (or
/// exhausted); [`SpanMatcher::spans`] returns the spans there.
#[derive(Debug)]
pub struct SpanMatcher {
    kind: SpanKind,
    current_doc: DocNum,
    spans: Vec<Span>,
    boost: f64,
}

impl SpanMatcher {
    /// Build a span matcher positioned on its first match.
    pub fn build(
        query: &SpanQuery,
        reader: &Arc<dyn IndexReader>,
        weighting: &Arc<dyn Weighting>,
    ) -> Result<Self> {
        let kind = match query {
            SpanQuery::Term { field, text } => {
                let field_type = reader.schema().require_field(field)?;
                if !field_type.has_positions() {
                    return Err(PennantError::invalid_argument(format!(
                        "Field '{field}' does not record positions"
                    )));
                }
                match PostingMatcher::open(reader, weighting, field, text, 1.0)? {
                    Some(postings) => SpanKind::Term(postings),
                    None => SpanKind::Empty,
                }
            }
            SpanQuery::First { query, limit } => SpanKind::First {
                inner: Box::new(Self::build(query, reader, weighting)?),
                limit: *limit,
            },
            SpanQuery::Near {
                queries,
                slop,
                ordered,
            } => {
                let mut queries = queries.iter();
                let Some(head) = queries.next() else {
                    return Err(PennantError::invalid_argument(
                        "Span near query needs at least one sub-query",
                    ));
                };
                let mut node = Self::build(head, reader, weighting)?;
                for query in queries {
                    let second = Self::build(query, reader, weighting)?;
                    node = Self::from_kind(SpanKind::Pair {
                        first: Box::new(node),
                        second: Box::new(second),
                        op: PairOp::Near {
                            slop: *slop,
                            ordered: *ordered,
                        },
                    })?;
                }
                return Ok(node);
            }
            SpanQuery::Or(queries) => SpanKind::Or(
                queries
                    .iter()
                    .map(|query| Self::build(query, reader, weighting))
                    .collect::<Result<Vec<_>>>()?,
            ),
            SpanQuery::Not { include, exclude } => SpanKind::Not {
                include: Box::new(Self::build(include, reader, weighting)?),
                exclude: Box::new(Self::build(exclude, reader, weighting)?),
            },
            SpanQuery::Contains { outer, inner } => SpanKind::Pair {
                first: Box::new(Self::build(outer, reader, weighting)?),
                second: Box::new(Self::build(inner, reader, weighting)?),
                op: PairOp::Contains,
            },
            SpanQuery::Before { first, second } => SpanKind::Pair {
                first: Box::new(Self::build(first, reader, weighting)?),
                second: Box::new(Self::build(second, reader, weighting)?),
                op: PairOp::Before,
            },
            SpanQuery::Condition { query, condition } => SpanKind::Condition {
                inner: Box::new(Self::build(query, reader, weighting)?),
                condition: Box::new(Matcher::build(condition, reader, weighting)?),
            },
        };
        Self::from_kind(kind)
    }

    fn from_kind(kind: SpanKind) -> Result<Self> {
        let mut matcher = SpanMatcher {
            kind,
            current_doc: NO_MORE_DOCS,
            spans: Vec::new(),
            boost: 1.0,
        };
        matcher.find_match()?;
        Ok(matcher)
    }

    /// Multiply this matcher's weight by `boost`.
    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = boost;
        self
    }

    /// Get the current document ID.
    pub fn doc_id(&self) -> DocNum {
        self.current_doc
    }

    /// Check if this matcher is positioned on a document.
    pub fn is_active(&self) -> bool {
        self.current_doc != NO_MORE_DOCS
    }

    /// Spans at the current document, sorted and deduplicated.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Move to the next matching document.
    pub fn next(&mut self) -> Result<bool> {
        if !self.is_active() {
            return Ok(false);
        }
        let doc = self.current_doc;
        match &mut self.kind {
            SpanKind::Empty => {}
            SpanKind::Term(postings) => {
                postings.next()?;
            }
            SpanKind::First { inner, .. }
            | SpanKind::Pair { first: inner, .. }
            | SpanKind::Not { include: inner, .. }
            | SpanKind::Condition { inner, .. } => {
                inner.next()?;
            }
            SpanKind::Or(children) => {
                for child in children.iter_mut().filter(|c| c.doc_id() == doc) {
                    child.next()?;
                }
            }
        }
        self.find_match()
    }

    /// Skip to the first matching document >= target.
    pub fn skip_to(&mut self, target: DocNum) -> Result<bool> {
        if !self.is_active() {
            return Ok(false);
        }
        if target <= self.current_doc {
            return Ok(true);
        }
        match &mut self.kind {
            SpanKind::Empty => {}
            SpanKind::Term(postings) => {
                postings.skip_to(target)?;
            }
            SpanKind::First { inner, .. }
            | SpanKind::Not { include: inner, .. }
            | SpanKind::Condition { inner, .. } => {
                inner.skip_to(target)?;
            }
            SpanKind::Pair { first, second, .. } => {
                first.skip_to(target)?;
                second.skip_to(target)?;
            }
            SpanKind::Or(children) => {
                for child in children.iter_mut() {
                    child.skip_to(target)?;
                }
            }
        }
        self.find_match()
    }

    /// Weight at the current document: the boosted sum of the weights of the
    /// term leaves positioned on it.
    pub fn weight(&self) -> Result<f64> {
        Ok(self.boost * self.leaf_weight(self.current_doc)?)
    }

    fn leaf_weight(&self, doc: DocNum) -> Result<f64> {
        match &self.kind {
            SpanKind::Empty => Ok(0.0),
            SpanKind::Term(postings) => {
                if postings.doc_id() == doc {
                    postings.weight()
                } else {
                    Ok(0.0)
                }
            }
            SpanKind::First { inner, .. }
            | SpanKind::Not { include: inner, .. }
            | SpanKind::Condition { inner, .. } => inner.leaf_weight(doc),
            SpanKind::Pair { first, second, .. } => {
                Ok(first.leaf_weight(doc)? + second.leaf_weight(doc)?)
            }
            SpanKind::Or(children) => children
                .iter()
                .map(|child| child.leaf_weight(doc))
                .sum(),
        }
    }

    /// Estimated number of candidate documents.
    pub fn cost(&self) -> u64 {
        match &self.kind {
            SpanKind::Empty => 0,
            SpanKind::Term(postings) => postings.cost(),
            SpanKind::First { inner, .. }
            | SpanKind::Not { include: inner, .. }
            | SpanKind::Condition { inner, .. } => inner.cost(),
            SpanKind::Pair { first, second, .. } => first.cost().min(second.cost()),
            SpanKind::Or(children) => children.iter().map(|c| c.cost()).sum(),
        }
    }

    /// Starting from the children's current positions, settle on the first
    /// document that has spans.
    fn find_match(&mut self) -> Result<bool> {
        let found = match &mut self.kind {
            SpanKind::Empty => None,
            SpanKind::Term(postings) => loop {
                if !postings.is_active() {
                    break None;
                }
                let spans = postings.spans()?;
                if !spans.is_empty() {
                    break Some((postings.doc_id(), spans));
                }
                postings.next()?;
            },
            SpanKind::First { inner, limit } => loop {
                if !inner.is_active() {
                    break None;
                }
                let spans: Vec<Span> = inner
                    .spans()
                    .iter()
                    .filter(|span| span.end <= *limit)
                    .copied()
                    .collect();
                if !spans.is_empty() {
                    break Some((inner.doc_id(), spans));
                }
                inner.next()?;
            },
            SpanKind::Pair { first, second, op } => loop {
                let Some(doc) = align(first, second)? else {
                    break None;
                };
                let spans = op.combine(first.spans(), second.spans());
                if !spans.is_empty() {
                    break Some((doc, spans));
                }
                first.next()?;
            },
            SpanKind::Or(children) => {
                let doc = children
                    .iter()
                    .filter(|child| child.is_active())
                    .map(|child| child.doc_id())
                    .min();
                doc.map(|doc| {
                    let mut spans: Vec<Span> = children
                        .iter()
                        .filter(|child| child.doc_id() == doc)
                        .flat_map(|child| child.spans().iter().copied())
                        .collect();
                    spans.sort_unstable();
                    spans.dedup();
                    (doc, spans)
                })
            }
            SpanKind::Not { include, exclude } => loop {
                if !include.is_active() {
                    break None;
                }
                let doc = include.doc_id();
                exclude.skip_to(doc)?;
                let excluded: &[Span] = if exclude.doc_id() == doc {
                    exclude.spans()
                } else {
                    &[]
                };
                let spans: Vec<Span> = include
                    .spans()
                    .iter()
                    .filter(|span| !excluded.iter().any(|e| e.overlaps(span)))
                    .copied()
                    .collect();
                if !spans.is_empty() {
                    break Some((doc, spans));
                }
                include.next()?;
            },
            SpanKind::Condition { inner, condition } => loop {
                if !inner.is_active() {
                    break None;
                }
                let doc = inner.doc_id();
                condition.skip_to(doc)?;
                if !condition.is_active() {
                    break None;
                }
                if condition.doc_id() == doc {
                    break Some((doc, inner.spans().to_vec()));
                }
                inner.skip_to(condition.doc_id())?;
            },
        };

        match found {
            Some((doc, spans)) => {
                self.current_doc = doc;
                self.spans = spans;
                Ok(true)
            }
            None => {
                self.current_doc = NO_MORE_DOCS;
                self.spans.clear();
                Ok(false)
            }
        }
    }
}

/// Leapfrog two matchers onto the same document.
fn align(a: &mut SpanMatcher, b: &mut SpanMatcher) -> Result<Option<DocNum>> {
    loop {
        if !a.is_active() || !b.is_active() {
            return Ok(None);
        }
        let (a_doc, b_doc) = (a.doc_id(), b.doc_id());
        if a_doc < b_doc {
            a.skip_to(b_doc)?;
        } else if b_doc < a_doc {
            b.skip_to(a_doc)?;
        } else {
            return Ok(Some(a_doc));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_relations() {
        let a = Span::new(2, 4);
        let b = Span::at(4);
        let c = Span::new(6, 5);

        assert_eq!(c, Span::new(5, 6));
        assert_eq!(a.length(), 3);
        assert!(a.overlaps(&b));
        assert!(a.contains(&b));
        assert!(!b.contains(&a));
        assert!(a.is_before(&c));
        assert!(!c.is_before(&a));
        assert_eq!(a.to(&c), Span::new(2, 6));
    }

    #[test]
    fn test_span_chars() {
        let bravo = Span::at(1).with_chars(5, 10);
        let echo = Span::at(2).with_chars(11, 15);
        let joined = bravo.to(&echo);
        assert_eq!((joined.start_char, joined.end_char), (Some(5), Some(15)));

        // Offsets never take part in comparisons
        assert_eq!(bravo, Span::at(1));
        let partial = Span::at(0).to(&echo);
        assert_eq!(partial, Span::new(0, 2));
        assert_eq!((partial.start_char, partial.end_char), (Some(11), Some(15)));
    }

    #[test]
    fn test_near_combination() {
        let first = [Span::at(1), Span::at(6)];
        let second = [Span::at(2), Span::at(5)];

        let ordered = PairOp::Near {
            slop: 1,
            ordered: true,
        }
        .combine(&first, &second);
        assert_eq!(ordered, vec![Span::new(1, 2)]);

        let unordered = PairOp::Near {
            slop: 1,
            ordered: false,
        }
        .combine(&first, &second);
        assert_eq!(unordered, vec![Span::new(1, 2), Span::new(5, 6)]);

        // The same position is never near itself
        let same = PairOp::Near {
            slop: 3,
            ordered: false,
        }
        .combine(&[Span::at(3)], &[Span::at(3)]);
        assert!(same.is_empty());
    }

    #[test]
    fn test_contains_and_before_combination() {
        let outer = [Span::new(0, 3), Span::new(5, 6)];
        let inner = [Span::at(2)];
        assert_eq!(PairOp::Contains.combine(&outer, &inner), vec![Span::new(0, 3)]);

        let before = PairOp::Before.combine(&[Span::at(1), Span::at(4)], &[Span::at(3)]);
        assert_eq!(before, vec![Span::new(1, 3)]);
    }

    #[test]
    fn test_span_query_description() {
        let query = SpanQuery::not(
            SpanQuery::near_with(
                vec![SpanQuery::term("text", "alfa"), SpanQuery::term("text", "charlie")],
                2,
                true,
            ),
            SpanQuery::term("text", "bravo"),
        );
        assert_eq!(
            query.to_string(),
            "spanNot(spanNear([text:alfa, text:charlie], 2, true), text:bravo)"
        );
    }
}
