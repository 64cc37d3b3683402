//! Query facets over search results.
//!
//! A facet is a named query. Counting or categorizing results by facets
//! intersects the results' query with each facet query in turn; facets may
//! overlap, so a document can fall into several of them.

use log::debug;

use crate::error::{PennantError, Result};
use crate::index::DocNum;
use crate::query::Query;
use crate::query::collector;
use crate::query::matcher::{ConjunctionMatcher, Matcher};
use crate::search::results::Results;

/// An insertion-ordered set of named facet queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facets {
    facets: Vec<(String, Query)>,
}

impl Facets {
    /// Create an empty facet set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a facet. Names must be unique.
    pub fn add_facet<S: Into<String>>(&mut self, name: S, query: Query) -> Result<()> {
        let name = name.into();
        if self.facets.iter().any(|(existing, _)| *existing == name) {
            return Err(PennantError::invalid_argument(format!(
                "Facet '{name}' already exists"
            )));
        }
        self.facets.push((name, query));
        Ok(())
    }

    /// Add a facet, builder style.
    pub fn with_facet<S: Into<String>>(mut self, name: S, query: Query) -> Result<Self> {
        self.add_facet(name, query)?;
        Ok(self)
    }

    /// Facet names in insertion order.
    pub fn facet_names(&self) -> impl Iterator<Item = &str> {
        self.facets.iter().map(|(name, _)| name.as_str())
    }

    /// Get a facet's query by name.
    pub fn get(&self, name: &str) -> Option<&Query> {
        self.facets
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, query)| query)
    }

    /// Number of facets.
    pub fn len(&self) -> usize {
        self.facets.len()
    }

    /// Check if there are no facets.
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    fn facet_matcher(results: &Results, query: &Query) -> Result<Matcher> {
        let reader = results.reader();
        let weighting = results.weighting();
        Matcher::build(query, reader, weighting)
    }

    /// Number of matching documents of `results` in each facet.
    pub fn counts(&self, results: &Results) -> Result<Vec<(String, u64)>> {
        let mut counts = Vec::with_capacity(self.facets.len());
        for (name, query) in &self.facets {
            let base = results.matcher()?;
            let facet = Self::facet_matcher(results, query)?;
            let both = ConjunctionMatcher::new(vec![base, facet])?;
            let count = collector::count(Matcher::Conjunction(both))?;
            counts.push((name.clone(), count));
        }
        debug!(
            "Counted {} facets over '{}'",
            counts.len(),
            results.query()
        );
        Ok(counts)
    }

    /// Matching documents of `results` in each facet, in ascending document
    /// order, each with its score under the results' query.
    pub fn categorize(&self, results: &Results) -> Result<Vec<(String, Vec<(DocNum, f64)>)>> {
        let mut categories = Vec::with_capacity(self.facets.len());
        for (name, query) in &self.facets {
            let mut base = results.matcher()?;
            let mut facet = Self::facet_matcher(results, query)?;

            let mut docs = Vec::new();
            while base.is_active() && facet.is_active() {
                let doc = base.doc_id();
                if facet.skip_to(doc)? && facet.doc_id() == doc {
                    docs.push((doc, base.weight()?));
                }
                base.next()?;
            }
            categories.push((name.clone(), docs));
        }
        debug!(
            "Categorized results of '{}' into {} facets",
            results.query(),
            categories.len()
        );
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_facet_names_are_rejected() {
        let mut facets = Facets::new();
        facets.add_facet("odd", Query::term("tag", "odd")).unwrap();
        facets.add_facet("even", Query::term("tag", "even")).unwrap();

        let err = facets.add_facet("odd", Query::all()).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(facets.len(), 2);
        assert_eq!(facets.facet_names().collect::<Vec<_>>(), vec!["odd", "even"]);
        assert_eq!(facets.get("even"), Some(&Query::term("tag", "even")));
    }
}
