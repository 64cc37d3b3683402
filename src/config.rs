//! Searcher configuration.
//!
//! Configuration is plain serde data with defaults for every field, so a JSON
//! document only needs to name what it changes:
//!
//! ```
//! use pennant::config::SearcherConfig;
//!
//! let config = SearcherConfig::from_json_str(r#"{ "bm25": { "k1": 2.0 } }"#).unwrap();
//! assert_eq!(config.bm25.k1, 2.0);
//! assert_eq!(config.bm25.b, 0.75);
//! assert_eq!(config.default_limit, Some(10));
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use crate::query::weighting::Bm25Config;

use crate::error::{PennantError, Result};

/// Configuration for a [`crate::search::Searcher`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearcherConfig {
    /// Limit used by `search_default`; `None` retains every match.
    pub default_limit: Option<usize>,
    /// Parameters of the default BM25 weighting.
    pub bm25: Bm25Config,
    /// Page length used by `search_page_default`.
    pub default_pagelen: usize,
}

impl Default for SearcherConfig {
    fn default() -> Self {
        SearcherConfig {
            default_limit: Some(10),
            bm25: Bm25Config::default(),
            default_pagelen: 10,
        }
    }
}

impl SearcherConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SearcherConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.bm25.k1 >= 0.0) {
            return Err(PennantError::config(format!(
                "bm25.k1 must be non-negative, got {}",
                self.bm25.k1
            )));
        }
        if !(0.0..=1.0).contains(&self.bm25.b) {
            return Err(PennantError::config(format!(
                "bm25.b must be within [0, 1], got {}",
                self.bm25.b
            )));
        }
        if self.default_limit == Some(0) {
            return Err(PennantError::config(
                "default_limit must be greater than zero (use null for no limit)",
            ));
        }
        if self.default_pagelen == 0 {
            return Err(PennantError::config("default_pagelen must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SearcherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_pagelen, 10);
    }

    #[test]
    fn test_partial_json() {
        let config = SearcherConfig::from_json_str(r#"{ "default_limit": null }"#).unwrap();
        assert_eq!(config.default_limit, None);
        assert_eq!(config.bm25, Bm25Config::default());
    }

    #[test]
    fn test_invalid_values() {
        for json in [
            r#"{ "bm25": { "k1": -1.0 } }"#,
            r#"{ "bm25": { "b": 1.5 } }"#,
            r#"{ "default_limit": 0 }"#,
            r#"{ "default_pagelen": 0 }"#,
        ] {
            let err = SearcherConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, PennantError::Config(_)), "{json}");
        }
    }

    #[test]
    fn test_malformed_json() {
        let err = SearcherConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, PennantError::Json(_)));
    }
}
