//! Error types for the Pennant library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`PennantError`] enum. Errors are reported synchronously by the call that
//! detects them; a search that fails never hands back a partial result.
//!
//! # Examples
//!
//! ```
//! use pennant::error::{PennantError, Result};
//!
//! fn checked_limit(limit: usize) -> Result<usize> {
//!     if limit == 0 {
//!         return Err(PennantError::invalid_argument("limit must be positive"));
//!     }
//!     Ok(limit)
//! }
//!
//! assert!(checked_limit(0).is_err());
//! assert_eq!(checked_limit(3).unwrap(), 3);
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Pennant operations.
#[derive(Error, Debug)]
pub enum PennantError {
    /// A caller supplied an argument outside its valid domain
    /// (zero limit, page number past the last page, rank out of bounds, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A query or key-term request referenced a field the schema does not declare.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Index-related errors raised by the index collaborator.
    #[error("Index error: {0}")]
    Index(String),

    /// Schema-related errors (duplicate declarations, ...).
    #[error("Schema error: {0}")]
    Schema(String),

    /// Configuration errors.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors (configuration files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic anyhow error, used by external index implementations.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with PennantError.
pub type Result<T> = std::result::Result<T, PennantError>;

impl PennantError {
    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        PennantError::InvalidArgument(msg.into())
    }

    /// Create a new unknown field error.
    pub fn unknown_field<S: Into<String>>(field: S) -> Self {
        PennantError::UnknownField(field.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        PennantError::Index(msg.into())
    }

    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        PennantError::Schema(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        PennantError::Config(msg.into())
    }

    /// Whether this error was caused by an invalid caller argument.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, PennantError::InvalidArgument(_))
    }

    /// Whether this error was caused by a reference to an undeclared field.
    pub fn is_unknown_field(&self) -> bool {
        matches!(self, PennantError::UnknownField(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = PennantError::invalid_argument("pagenum must be >= 1");
        assert_eq!(
            error.to_string(),
            "Invalid argument: pagenum must be >= 1"
        );
        assert!(error.is_invalid_argument());

        let error = PennantError::unknown_field("color");
        assert_eq!(error.to_string(), "Unknown field: color");
        assert!(error.is_unknown_field());
        assert!(!error.is_invalid_argument());

        let error = PennantError::index("writer already committed");
        assert_eq!(error.to_string(), "Index error: writer already committed");
    }

    #[test]
    fn test_error_from_io() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error = PennantError::from(io_error);

        match error {
            PennantError::Io(_) => {} // Expected
            _ => panic!("Expected IO error"),
        }
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: PennantError = json_error.into();
        assert!(matches!(error, PennantError::Json(_)));
    }
}
