//! Result and error types for idweave.
//!
//! Identifier generation and decoration never fail. Errors only exist at the
//! edges where the crate reads external input: configuration documents,
//! localization catalogs and debug-log export.

use thiserror::Error;

/// Result type for idweave operations
pub type IdweaveResult<T> = Result<T, IdweaveError>;

/// Errors that can occur while loading or exporting idweave data
#[derive(Debug, Error)]
pub enum IdweaveError {
    /// Configuration source could not be interpreted
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// Localization catalog line could not be parsed
    #[error("Catalog parse error at line {line}: {message}")]
    CatalogParse {
        /// 1-based line number
        line: usize,
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}
