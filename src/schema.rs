//! Schema management for document structure definition.
//!
//! The schema declares which fields exist and, per field, whether values are
//! stored, indexed (and with which analyzer), scorable (field lengths
//! recorded), positional, and vectored (per-document term vectors kept for
//! key-term extraction). Field names used by queries are checked against it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::analysis::{Analyzer, KeywordAnalyzer, StandardAnalyzer};
use crate::error::{PennantError, Result};

/// How a single field is handled by the index.
#[derive(Clone)]
pub struct FieldType {
    analyzer: Option<Arc<dyn Analyzer>>,
    stored: bool,
    scorable: bool,
    positions: bool,
    vector: bool,
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldType")
            .field(
                "analyzer",
                &self.analyzer.as_ref().map(|a| format!("<{}>", a.name())),
            )
            .field("stored", &self.stored)
            .field("scorable", &self.scorable)
            .field("positions", &self.positions)
            .field("vector", &self.vector)
            .finish()
    }
}

impl FieldType {
    /// A full-text field: standard analysis, scorable, with positions.
    pub fn text() -> Self {
        FieldType {
            analyzer: Some(Arc::new(StandardAnalyzer::new())),
            stored: false,
            scorable: true,
            positions: true,
            vector: false,
        }
    }

    /// An identifier field: the whole value is one term; not scorable.
    pub fn id() -> Self {
        FieldType {
            analyzer: Some(Arc::new(KeywordAnalyzer::new())),
            stored: false,
            scorable: false,
            positions: false,
            vector: false,
        }
    }

    /// A field that is stored but not indexed.
    pub fn stored_only() -> Self {
        FieldType {
            analyzer: None,
            stored: true,
            scorable: false,
            positions: false,
            vector: false,
        }
    }

    /// Set whether values are stored.
    pub fn stored(mut self, stored: bool) -> Self {
        self.stored = stored;
        self
    }

    /// Set whether per-document term vectors are kept.
    pub fn vectored(mut self, vector: bool) -> Self {
        self.vector = vector;
        self
    }

    /// Set whether field lengths are recorded for length normalization.
    pub fn scorable(mut self, scorable: bool) -> Self {
        self.scorable = scorable;
        self
    }

    /// Set whether term positions are recorded.
    pub fn positions(mut self, positions: bool) -> Self {
        self.positions = positions;
        self
    }

    /// Replace the analyzer used to index this field.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// The analyzer, if the field is indexed.
    pub fn analyzer(&self) -> Option<&Arc<dyn Analyzer>> {
        self.analyzer.as_ref()
    }

    /// Whether the field is indexed.
    pub fn is_indexed(&self) -> bool {
        self.analyzer.is_some()
    }

    /// Whether values are stored.
    pub fn is_stored(&self) -> bool {
        self.stored
    }

    /// Whether field lengths are recorded.
    pub fn is_scorable(&self) -> bool {
        self.scorable && self.is_indexed()
    }

    /// Whether positions are recorded.
    pub fn has_positions(&self) -> bool {
        self.positions && self.is_indexed()
    }

    /// Whether term vectors are kept.
    pub fn has_vectors(&self) -> bool {
        self.vector && self.is_indexed()
    }
}

/// A schema defines the structure of documents in an index.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    /// Map of field names to their types
    fields: HashMap<String, FieldType>,
    /// Ordered list of field names (for consistent ordering)
    field_names: Vec<String>,
}

impl Schema {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Schema::default()
    }

    /// Add a field to the schema.
    pub fn add_field<S: Into<String>>(&mut self, name: S, field_type: FieldType) -> Result<()> {
        let name = name.into();

        if name.is_empty() {
            return Err(PennantError::schema("Field name cannot be empty"));
        }
        if self.fields.contains_key(&name) {
            return Err(PennantError::schema(format!(
                "Field '{name}' already exists"
            )));
        }

        self.fields.insert(name.clone(), field_type);
        self.field_names.push(name);
        Ok(())
    }

    /// Builder-style variant of [`Schema::add_field`].
    pub fn with_field<S: Into<String>>(mut self, name: S, field_type: FieldType) -> Result<Self> {
        self.add_field(name, field_type)?;
        Ok(self)
    }

    /// Get a field type by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldType> {
        self.fields.get(name)
    }

    /// Get a field type, failing with [`PennantError::UnknownField`] if undeclared.
    pub fn require_field(&self, name: &str) -> Result<&FieldType> {
        self.fields
            .get(name)
            .ok_or_else(|| PennantError::unknown_field(name))
    }

    /// Check if a field exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Get all field names in the order they were added.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.field_names.len()
    }

    /// Whether no field is declared.
    pub fn is_empty(&self) -> bool {
        self.field_names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_add_field() {
        let mut schema = Schema::new();
        schema.add_field("title", FieldType::text().stored(true)).unwrap();
        schema.add_field("id", FieldType::id().stored(true)).unwrap();

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.field_names(), &["title".to_string(), "id".to_string()]);
        assert!(schema.get_field("title").unwrap().is_scorable());
        assert!(!schema.get_field("id").unwrap().is_scorable());
    }

    #[test]
    fn test_schema_duplicate_field() {
        let mut schema = Schema::new();
        schema.add_field("title", FieldType::text()).unwrap();

        let result = schema.add_field("title", FieldType::id());
        assert!(matches!(result, Err(PennantError::Schema(_))));
        assert!(schema.add_field("", FieldType::id()).is_err());
    }

    #[test]
    fn test_require_field() {
        let schema = Schema::new().with_field("content", FieldType::text()).unwrap();

        assert!(schema.require_field("content").is_ok());
        assert!(schema.require_field("body").unwrap_err().is_unknown_field());
    }

    #[test]
    fn test_stored_only_field_is_not_indexed() {
        let field = FieldType::stored_only().vectored(true);
        assert!(!field.is_indexed());
        assert!(!field.has_vectors());
        assert!(!field.has_positions());
        assert!(field.is_stored());
    }
}
