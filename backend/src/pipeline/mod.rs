//! End-to-end validation run.
//!
//! Ties the collaborators around the validation core together:
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Dataset   │────▶│    Batch    │────▶│    Sinks    │────▶│   Report +  │
//! │  (CSV/JSON) │     │  Processor  │     │ valid/inval │     │  Notifier   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! Source, schema and sink failures abort the run. A failed notification
//! is logged and ignored.
//!
//! # Example
//!
//! ```rust,ignore
//! use orderguard::{pipeline, ChannelNotifier, PipelineConfig, RunOptions};
//!
//! let config = PipelineConfig::load(None)?;
//! let notifier = ChannelNotifier::from_config(config.webhook_url.as_deref(), true);
//! let outcome = pipeline::run(Path::new("orders.csv"), &config, &RunOptions::default(), &notifier).await?;
//! std::process::exit(outcome.exit_code());
//! ```

use std::path::{Path, PathBuf};

use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::batch::{process, BatchResult};
use crate::columns::{run_column_checks, ColumnReport};
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::notify::{Notifier, NotifyOutcome};
use crate::parser::{read_dataset, Dataset};
use crate::report::{format_column_report, format_summary};
use crate::schema::RecordSchema;
use crate::sink::{write_invalid, write_valid};

/// Where the partitions go and whether to notify.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Valid rows output (skipped when `None`)
    pub valid_out: Option<PathBuf>,
    /// Invalid rows output (skipped when `None`)
    pub invalid_out: Option<PathBuf>,
    /// Send the report through the notifier
    pub notify: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            valid_out: Some(PathBuf::from("data/valid_rows.csv")),
            invalid_out: Some(PathBuf::from("data/invalid_rows.csv")),
            notify: true,
        }
    }
}

/// Validation results and the rendered report, without any I/O.
#[derive(Debug, Clone)]
pub struct Validated {
    pub batch: BatchResult,
    /// Present when column checks are configured
    pub columns: Option<ColumnReport>,
    /// Report text (row summary, then column checks)
    pub report: String,
}

impl Validated {
    /// CI exit code: 0 when no row is invalid, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        self.batch.summary.exit_code()
    }
}

/// Outcome of a full run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub validated: Validated,
    /// `None` when notification was not requested
    pub notification: Option<NotifyOutcome>,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        self.validated.exit_code()
    }
}

/// Validate a dataset and render the report. Pure.
///
/// Rows are validated on their schema fields; column checks see every
/// source column.
pub fn validate_dataset(
    dataset: &Dataset,
    schema: &RecordSchema,
    config: &PipelineConfig,
) -> Validated {
    let batch = process(schema, &dataset.records, config.preview_size);

    let columns = (!config.column_checks.is_empty())
        .then(|| run_column_checks(&dataset.source_records, &config.column_checks));

    let mut report = format_summary(&batch.summary, &config.report_options());
    if let Some(columns) = &columns {
        report.push('\n');
        report.push_str(&format_column_report(columns));
    }

    Validated {
        batch,
        columns,
        report,
    }
}

/// Run the whole pipeline over one input file.
pub async fn run<N: Notifier>(
    input: &Path,
    config: &PipelineConfig,
    options: &RunOptions,
    notifier: &N,
) -> PipelineResult<RunOutcome> {
    let schema = config.build_schema()?;
    log_info(format!("📋 Schema: {} fields", schema.len()));

    log_info(format!("📖 Reading {}", input.display()));
    let dataset = read_dataset(input, &config.rename, &schema)?;
    if let Some(delimiter) = dataset.delimiter {
        log_success(format!(
            "Detected encoding: {}, separator: '{}'",
            dataset.encoding,
            format_delimiter(delimiter)
        ));
    }
    log_success(format!("Read {} rows", dataset.records.len()));

    log_info("✔️  Validating rows...");
    let validated = validate_dataset(&dataset, &schema, config);
    print_validation_result(&validated);

    write_outputs(&schema, &validated.batch, options)?;

    let notification = if options.notify {
        let outcome = notifier.send(&validated.report).await;
        if outcome.delivered {
            log_success("Notification sent");
        } else {
            log_warning(format!(
                "Notification not delivered ({}): {}",
                outcome
                    .status_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "no response".to_string()),
                outcome.detail
            ));
        }
        Some(outcome)
    } else {
        None
    };

    Ok(RunOutcome {
        validated,
        notification,
    })
}

fn write_outputs(schema: &RecordSchema, batch: &BatchResult, options: &RunOptions) -> PipelineResult<()> {
    if let Some(path) = &options.valid_out {
        write_valid(path, schema, &batch.valid)?;
        log_success(format!("💾 {} valid rows → {}", batch.valid.len(), path.display()));
    }
    if let Some(path) = &options.invalid_out {
        write_invalid(path, schema, &batch.invalid)?;
        log_success(format!("💾 {} invalid rows → {}", batch.invalid.len(), path.display()));
    }
    Ok(())
}

fn print_validation_result(validated: &Validated) {
    let summary = &validated.batch.summary;
    if summary.passed() {
        log_success(format!("All {} rows valid!", summary.total));
    } else {
        log_success(format!("Valid: {}", summary.valid));
        log_error(format!("Invalid: {}", summary.invalid));
        for row in validated.batch.invalid.iter().take(summary.preview.len()) {
            log_error(row.joined_errors());
        }
    }

    if let Some(columns) = &validated.columns {
        if columns.all_passed() {
            log_success(format!("All {} column checks passed", columns.results.len()));
        } else {
            log_warning(format!("{} column checks failed", columns.failed()));
        }
    }
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}
