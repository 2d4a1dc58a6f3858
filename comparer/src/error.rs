//! Error types for the inventory comparison pipeline.
//!
//! - [`ParseError`] - an input file could not be decoded or parsed
//! - [`ProcessingError`] - the comparison itself failed unexpectedly
//! - [`ExportError`] - an export file could not be written
//! - [`ConfigError`] - an options file could not be loaded
//! - [`ComparerError`] - top-level error used by the CLI
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Input Parsing Errors
// =============================================================================

/// Errors while reading an inventory file.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Content could not be decoded.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// Delimiter must be a single ASCII character.
    #[error("Unsupported delimiter {0:?}")]
    InvalidDelimiter(char),

    /// Header row has no usable column names.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// A record could not be read.
    #[error("Line {line}: {message}")]
    Malformed { line: u64, message: String },
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        ParseError::Malformed {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Comparison Errors
// =============================================================================

/// Unexpected failures while reconciling two datasets.
///
/// Data-shape problems never end up here: bad prices default to zero and
/// incomplete rows are dropped during normalization.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The comparison worker panicked or was torn down.
    #[error("{0}")]
    Worker(String),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing an export file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading [`crate::compare::CompareOptions`] from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read options file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid options file: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("Invalid option '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

// =============================================================================
// Top-level Errors
// =============================================================================

/// Top-level error wrapping every lower-level error.
#[derive(Debug, Error)]
pub enum ComparerError {
    #[error("Error parsing CSV: {0}")]
    Parse(#[from] ParseError),

    #[error("Error processing files: {0}")]
    Processing(#[from] ProcessingError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown section or column given on the command line.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for input parsing operations.
pub type InputResult<T> = Result<T, ParseError>;

/// Result type for comparison operations.
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for CLI-level operations.
pub type ComparerResult<T> = Result<T, ComparerError>;
