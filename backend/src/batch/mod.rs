//! Batch processing: validate a whole dataset and summarize it.
//!
//! Records are validated one by one, in input order. A failing record
//! never stops the batch; it lands in the invalid partition with its
//! errors and processing moves on.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Record, TypedRecord};
use crate::schema::RecordSchema;
use crate::validation::{validate_record, ErrorKind, InvalidRow, RowOutcome};

/// Number of invalid rows previewed in a summary unless configured otherwise.
pub const DEFAULT_PREVIEW_SIZE: usize = 3;

/// Aggregate view of one batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Number of input records
    pub total: usize,
    /// Number of records that passed
    pub valid: usize,
    /// Number of records that failed
    pub invalid: usize,
    /// Occurrences of each error kind across all invalid records
    pub histogram: BTreeMap<ErrorKind, usize>,
    /// Joined messages of the first invalid records
    pub preview: Vec<String>,
}

impl BatchSummary {
    /// True when no record failed.
    pub fn passed(&self) -> bool {
        self.invalid == 0
    }

    /// Process exit code for CI: 0 when every record is valid, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }

    /// Total number of errors across all invalid records.
    pub fn error_count(&self) -> usize {
        self.histogram.values().sum()
    }
}

/// Partitioned output of a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    /// Typed records, in input order
    pub valid: Vec<TypedRecord>,
    /// Raw records with their errors, in input order
    pub invalid: Vec<InvalidRow>,
    /// Input position of each entry in `invalid`
    pub invalid_indices: Vec<usize>,
    pub summary: BatchSummary,
}

/// Validate every record and partition the outcomes.
///
/// # Arguments
/// * `schema` - Schema to validate against
/// * `records` - Input records, in order
/// * `preview_size` - How many invalid rows to include in the summary preview
pub fn process(schema: &RecordSchema, records: &[Record], preview_size: usize) -> BatchResult {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    let mut invalid_indices = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match validate_record(schema, record) {
            RowOutcome::Valid(typed) => valid.push(typed),
            RowOutcome::Invalid(row) => {
                invalid.push(row);
                invalid_indices.push(index);
            }
        }
    }

    let summary = summarize(records.len(), valid.len(), &invalid, preview_size);

    BatchResult {
        valid,
        invalid,
        invalid_indices,
        summary,
    }
}

fn summarize(total: usize, valid: usize, invalid: &[InvalidRow], preview_size: usize) -> BatchSummary {
    let mut histogram = BTreeMap::new();
    for error in invalid.iter().flat_map(|row| row.errors()) {
        *histogram.entry(error.kind).or_insert(0) += 1;
    }

    let preview = invalid
        .iter()
        .take(preview_size)
        .map(InvalidRow::joined_errors)
        .collect();

    BatchSummary {
        total,
        valid,
        invalid: invalid.len(),
        histogram,
        preview,
    }
}
