//! # Orderguard - row-level validation for order exports
//!
//! Orderguard checks every record of an order dataset against a declarative
//! schema, partitions the rows into valid and invalid sets, and reports the
//! outcome to a notification channel and to CI through the exit code.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV/JSON  │────▶│   Parser    │────▶│  Validator  │────▶│   Report    │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (per field) │     │  + sinks    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use orderguard::{process, RecordSchema};
//!
//! let schema = RecordSchema::orders();
//! let result = process(&schema, &records, 3);
//! println!("{} valid, {} invalid", result.summary.valid, result.summary.invalid);
//! std::process::exit(result.summary.exit_code());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Record representation
//! - [`schema`] - Field rules and record schemas
//! - [`validation`] - Per-record validation with collect-all semantics
//! - [`batch`] - Partitioning and summary over a dataset
//! - [`columns`] - Whole-column checks
//! - [`report`] - Plain-text report formatting
//! - [`parser`] - CSV/JSON reading with auto-detection
//! - [`sink`] - Valid/invalid partition writers
//! - [`notify`] - Webhook notifications
//! - [`config`] - Configuration loading
//! - [`pipeline`] - End-to-end runs
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Validation core
pub mod schema;
pub mod validation;
pub mod batch;
pub mod columns;
pub mod report;

// Dataset I/O
pub mod parser;
pub mod sink;

// Notifications
pub mod notify;

// Orchestration
pub mod config;
pub mod pipeline;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    SchemaError,
    ConfigError,
    CsvError,
    SinkError,
    PipelineError,
    ServerError,
};

// =============================================================================
// Re-exports - Schema & Validation
// =============================================================================

pub use models::{Record, TypedRecord};

pub use schema::{
    FieldRule,
    FieldSpec,
    RecordSchema,
    SchemaConfig,
    FieldConfig,
    RuleConfig,
};

pub use validation::{
    validate_record,
    ErrorKind,
    ValidationError,
    InvalidRow,
    RowOutcome,
};

pub use batch::{process, BatchResult, BatchSummary};

pub use columns::{run_column_checks, ColumnCheck, ColumnCheckResult, ColumnReport};

pub use report::{format_summary, format_column_report, ReportOptions};

// =============================================================================
// Re-exports - Dataset I/O
// =============================================================================

pub use parser::{
    read_dataset,
    parse_dataset_bytes,
    parse_bytes_auto,
    detect_encoding,
    detect_delimiter,
    decode_content,
    Dataset,
    ParseResult,
};

pub use sink::{write_valid, write_invalid};

// =============================================================================
// Re-exports - Notifications, config, pipeline
// =============================================================================

pub use notify::{Notifier, NotifyOutcome, WebhookNotifier, DisabledNotifier, ChannelNotifier};

pub use config::PipelineConfig;

pub use pipeline::{run, validate_dataset, RunOptions, RunOutcome, Validated};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
