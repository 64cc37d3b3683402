//! Query model and query execution.
//!
//! A [`Query`] is an immutable tree describing what to match. It has no
//! behaviour of its own beyond structural composition: [`matcher::Matcher`]
//! turns it into a cursor over matching documents, consulting a
//! [`weighting::Weighting`] for scores, and [`collector`] ranks what the
//! cursor yields.

pub mod collector;
pub mod matcher;
pub mod span;
pub mod weighting;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use self::span::{Span, SpanQuery};

/// A query tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    /// Documents containing `text` in `field`.
    ///
    /// The text is matched as-is; it is not analyzed.
    Term {
        /// Field to search in.
        field: String,
        /// Exact term text.
        text: String,
        /// Multiplier applied to the term's weight.
        boost: f64,
    },
    /// Documents with any indexed value in `field`, or every live document
    /// when `field` is `None`.
    Every {
        /// Restricting field.
        field: Option<String>,
    },
    /// Documents matching all children.
    And(Vec<Query>),
    /// Documents matching any child.
    Or(Vec<Query>),
    /// Documents matching `positive` but not `negative`.
    AndNot {
        /// Query documents must match.
        positive: Box<Query>,
        /// Query documents must not match.
        negative: Box<Query>,
    },
    /// Words occurring in order, each within `slop` positions of the previous.
    Phrase {
        /// Field to search in.
        field: String,
        /// Terms in phrase order.
        words: Vec<String>,
        /// Maximum position gap between consecutive words (1 = adjacent).
        slop: u32,
        /// Multiplier applied to the phrase's weight.
        boost: f64,
    },
    /// A positional span query.
    Span(SpanQuery),
}

impl Query {
    /// Create a term query.
    pub fn term<F: Into<String>, T: Into<String>>(field: F, text: T) -> Self {
        Query::Term {
            field: field.into(),
            text: text.into(),
            boost: 1.0,
        }
    }

    /// Create a query matching every document with a value in `field`.
    pub fn every<F: Into<String>>(field: F) -> Self {
        Query::Every {
            field: Some(field.into()),
        }
    }

    /// Create a query matching every live document.
    pub fn all() -> Self {
        Query::Every { field: None }
    }

    /// Create a conjunction.
    pub fn and(children: Vec<Query>) -> Self {
        Query::And(children)
    }

    /// Create a disjunction.
    pub fn or(children: Vec<Query>) -> Self {
        Query::Or(children)
    }

    /// Create an exclusion query.
    pub fn and_not(positive: Query, negative: Query) -> Self {
        Query::AndNot {
            positive: Box::new(positive),
            negative: Box::new(negative),
        }
    }

    /// Create a phrase query over adjacent words.
    pub fn phrase<F, I, W>(field: F, words: I) -> Self
    where
        F: Into<String>,
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        Query::Phrase {
            field: field.into(),
            words: words.into_iter().map(Into::into).collect(),
            slop: 1,
            boost: 1.0,
        }
    }

    /// Set the slop of a phrase query; other queries are returned unchanged.
    pub fn with_slop(mut self, new_slop: u32) -> Self {
        if let Query::Phrase { slop, .. } = &mut self {
            *slop = new_slop;
        }
        self
    }

    /// Set the boost of a term or phrase query; other queries are returned unchanged.
    pub fn with_boost(mut self, new_boost: f64) -> Self {
        match &mut self {
            Query::Term { boost, .. } | Query::Phrase { boost, .. } => *boost = new_boost,
            _ => {}
        }
        self
    }

    /// All field names referenced by this query, in traversal order, deduplicated.
    pub fn fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        self.visit_fields(&mut |field| {
            if !fields.iter().any(|f| f == field) {
                fields.push(field.to_string());
            }
        });
        fields
    }

    pub(crate) fn visit_fields<'a>(&'a self, visit: &mut dyn FnMut(&'a str)) {
        match self {
            Query::Term { field, .. } | Query::Phrase { field, .. } => visit(field),
            Query::Every { field } => {
                if let Some(field) = field {
                    visit(field);
                }
            }
            Query::And(children) | Query::Or(children) => {
                for child in children {
                    child.visit_fields(visit);
                }
            }
            Query::AndNot { positive, negative } => {
                positive.visit_fields(visit);
                negative.visit_fields(visit);
            }
            Query::Span(span) => span.visit_fields(visit),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, children: &[Query], sep: &str) -> fmt::Result {
            write!(f, "(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, " {sep} ")?;
                }
                write!(f, "{child}")?;
            }
            write!(f, ")")
        }

        match self {
            Query::Term { field, text, boost } => {
                if *boost == 1.0 {
                    write!(f, "{field}:{text}")
                } else {
                    write!(f, "{field}:{text}^{boost}")
                }
            }
            Query::Every { field: Some(field) } => write!(f, "{field}:*"),
            Query::Every { field: None } => write!(f, "*"),
            Query::And(children) => join(f, children, "AND"),
            Query::Or(children) => join(f, children, "OR"),
            Query::AndNot { positive, negative } => write!(f, "({positive} ANDNOT {negative})"),
            Query::Phrase {
                field, words, slop, ..
            } => {
                write!(f, "{field}:\"{}\"", words.join(" "))?;
                if *slop != 1 {
                    write!(f, "~{slop}")?;
                }
                Ok(())
            }
            Query::Span(span) => write!(f, "{span}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_query_description() {
        let query = Query::term("title", "hello");
        assert_eq!(query.to_string(), "title:hello");

        let boosted = Query::term("title", "hello").with_boost(2.0);
        assert_eq!(boosted.to_string(), "title:hello^2");
    }

    #[test]
    fn test_compound_description() {
        let query = Query::and(vec![
            Query::term("a", "alfa"),
            Query::or(vec![Query::term("a", "bravo"), Query::every("b")]),
        ]);
        assert_eq!(query.to_string(), "(a:alfa AND (a:bravo OR b:*))");

        let query = Query::and_not(Query::all(), Query::phrase("c", ["x", "y"]).with_slop(3));
        assert_eq!(query.to_string(), "(* ANDNOT c:\"x y\"~3)");
    }

    #[test]
    fn test_fields() {
        let query = Query::and(vec![
            Query::term("title", "a"),
            Query::term("content", "b"),
            Query::term("title", "c"),
            Query::all(),
        ]);
        assert_eq!(query.fields(), vec!["title".to_string(), "content".to_string()]);
    }

    #[test]
    fn test_query_serde() {
        let query = Query::or(vec![Query::term("a", "alfa"), Query::every("b")]);
        let json = serde_json::to_string(&query).unwrap();
        let decoded: Query = serde_json::from_str(&json).unwrap();
        assert_eq!(query, decoded);
    }
}
