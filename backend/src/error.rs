//! Error types for the orderguard pipeline.
//!
//! Only operational failures live here. Data problems found in a record are
//! never errors in this sense: they are collected as
//! [`crate::validation::ValidationError`] values inside a row outcome.
//!
//! - [`SchemaError`] - Record schema construction errors
//! - [`ConfigError`] - Configuration loading errors
//! - [`CsvError`] - Dataset source errors
//! - [`SinkError`] - Dataset sink errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors while building a [`crate::schema::RecordSchema`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The same field name appears twice.
    #[error("Duplicate field in schema: {0}")]
    DuplicateField(String),

    /// A rule names a constant or set that the configuration does not define.
    #[error("Field '{field}' references undefined constant '{name}'")]
    UndefinedConstant { field: String, name: String },

    /// A rule is structurally invalid.
    #[error("Malformed rule for field '{field}': {message}")]
    MalformedRule { field: String, message: String },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading a [`crate::config::PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Config file is not valid JSON for the expected shape.
    #[error("Invalid config file: {0}")]
    JsonError(#[from] serde_json::Error),

    /// An environment variable holds an unusable value.
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: String, value: String },
}

// =============================================================================
// Dataset Source Errors
// =============================================================================

/// Errors while reading the input dataset.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode the file contents.
    #[error("Failed to decode content as {0}")]
    EncodingError(String),

    /// Invalid CSV format.
    #[error("Line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// JSON input is not an array of objects.
    #[error("Invalid JSON dataset: {0}")]
    JsonError(String),

    /// Empty file.
    #[error("Dataset is empty")]
    EmptyFile,

    /// A required schema field has no matching column after renaming.
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

// =============================================================================
// Dataset Sink Errors
// =============================================================================

/// Errors while persisting the valid/invalid partitions.
#[derive(Debug, Error)]
pub enum SinkError {
    /// IO error.
    #[error("Failed to write output: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV writer error.
    #[error("Failed to write CSV: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON error.
    #[error("Failed to write JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::pipeline::run`].
/// It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Schema error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Dataset source error.
    #[error("Source error: {0}")]
    Source(#[from] CsvError),

    /// Dataset sink error.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for schema construction.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for dataset reading.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for dataset writing.
pub type SinkResult<T> = Result<T, SinkError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> PipelineError
        let csv_err = CsvError::EmptyFile;
        let pipeline_err: PipelineError = csv_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // SchemaError -> PipelineError
        let schema_err = SchemaError::DuplicateField("qty".into());
        let pipeline_err: PipelineError = schema_err.into();
        assert!(matches!(pipeline_err, PipelineError::Schema(_)));
        assert!(pipeline_err.to_string().contains("qty"));
    }

    #[test]
    fn test_schema_error_format() {
        let err = SchemaError::UndefinedConstant {
            field: "currency".into(),
            name: "allowed_currency".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("currency"));
        assert!(msg.contains("allowed_currency"));
    }

    #[test]
    fn test_missing_column_format() {
        let err = CsvError::MissingColumn("order_id".into());
        assert_eq!(err.to_string(), "Missing required column: order_id");
    }
}
