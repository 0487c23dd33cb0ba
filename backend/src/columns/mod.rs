//! Whole-column expectations.
//!
//! A second, independent pass over a dataset. Each [`ColumnCheck`] looks at
//! every value of one column and counts the values that break it. Results
//! are reported next to the row-level summary but never change it.
//!
//! Absent values are only counted by `not_null`; the other checks skip them.
//! A check on a column that no record has fails with every value unexpected.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::models::{is_absent, value_to_cell, Record};

/// One expectation over a whole column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum ColumnCheck {
    /// Every value is present.
    NotNull { column: String },

    /// No present value occurs more than once.
    Unique { column: String },

    /// Every present value is a number within the bounds (inclusive).
    Between {
        column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },

    /// Every present value is one of `values`.
    InSet { column: String, values: Vec<String> },
}

impl ColumnCheck {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnCheck::NotNull { .. } => "not_null",
            ColumnCheck::Unique { .. } => "unique",
            ColumnCheck::Between { .. } => "between",
            ColumnCheck::InSet { .. } => "in_set",
        }
    }

    pub fn column(&self) -> &str {
        match self {
            ColumnCheck::NotNull { column }
            | ColumnCheck::Unique { column }
            | ColumnCheck::Between { column, .. }
            | ColumnCheck::InSet { column, .. } => column,
        }
    }

    /// Count the values of the column that break this check.
    fn count_unexpected(&self, records: &[Record]) -> usize {
        let values = records.iter().map(|r| r.get(self.column()));

        match self {
            ColumnCheck::NotNull { .. } => values.filter(|v| is_absent(*v)).count(),

            ColumnCheck::Unique { .. } => {
                let mut seen: HashMap<String, usize> = HashMap::new();
                for value in values.flatten().filter(|v| !v.is_null()) {
                    *seen.entry(value_to_cell(value)).or_insert(0) += 1;
                }
                seen.values().filter(|&&n| n > 1).sum()
            }

            ColumnCheck::Between { min, max, .. } => values
                .flatten()
                .filter(|v| !v.is_null())
                .filter(|v| match as_number(v) {
                    Some(n) => min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m),
                    None => true,
                })
                .count(),

            ColumnCheck::InSet { values: allowed, .. } => values
                .flatten()
                .filter(|v| !v.is_null())
                .filter(|v| !allowed.contains(&value_to_cell(v)))
                .count(),
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Outcome of one column check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnCheckResult {
    pub check: String,
    pub column: String,
    pub success: bool,
    pub element_count: usize,
    pub unexpected_count: usize,
    /// No record has the column
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub column_missing: bool,
}

/// Outcomes of all configured column checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnReport {
    pub results: Vec<ColumnCheckResult>,
}

impl ColumnReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

/// Run every check over the records.
pub fn run_column_checks(records: &[Record], checks: &[ColumnCheck]) -> ColumnReport {
    let results = checks
        .iter()
        .map(|check| {
            let column_missing =
                !records.is_empty() && !records.iter().any(|r| r.contains_key(check.column()));
            let unexpected_count = if column_missing {
                records.len()
            } else {
                check.count_unexpected(records)
            };

            ColumnCheckResult {
                check: check.name().to_string(),
                column: check.column().to_string(),
                success: unexpected_count == 0,
                element_count: records.len(),
                unexpected_count,
                column_missing,
            }
        })
        .collect();

    ColumnReport { results }
}
