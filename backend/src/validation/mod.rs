//! Row-level validation against a [`RecordSchema`].
//!
//! Every field of the schema is evaluated independently, in schema order,
//! and every violation is collected: a failing field never stops the
//! remaining fields from being checked. The result is a [`RowOutcome`],
//! never an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use orderguard::{RecordSchema, RowOutcome};
//!
//! let record = json!({ "order_id": "", "qty": -2 }).as_object().cloned().unwrap();
//! match RecordSchema::orders().validate(&record) {
//!     RowOutcome::Valid(typed) => println!("ok: {:?}", typed),
//!     RowOutcome::Invalid(row) => println!("invalid: {}", row.joined_errors()),
//! }
//! ```

mod rules;

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::models::{is_absent, Record, TypedRecord};
use crate::schema::{FieldSpec, RecordSchema};

/// Separator used when joining a row's messages into one line.
pub const ERROR_SEPARATOR: &str = "; ";

/// Kind of data violation. Used as the histogram key in batch summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ErrorKind {
    MissingRequiredField,
    EmptyStringError,
    TypeCoercionError,
    RangeError,
    ConstantMismatchError,
    ValueNotAllowedError,
    DateFormatError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingRequiredField => "MissingRequiredField",
            ErrorKind::EmptyStringError => "EmptyStringError",
            ErrorKind::TypeCoercionError => "TypeCoercionError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::ConstantMismatchError => "ConstantMismatchError",
            ErrorKind::ValueNotAllowedError => "ValueNotAllowedError",
            ErrorKind::DateFormatError => "DateFormatError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violation found in one field of one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A record that failed validation, with every violation found in it.
///
/// The error list is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidRow {
    record: Record,
    errors: Vec<ValidationError>,
}

impl InvalidRow {
    /// The record exactly as it was read.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Violations in schema field order.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// All messages on one line, e.g. for a log entry or an `error` column.
    pub fn joined_errors(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(ERROR_SEPARATOR)
    }

    pub fn into_parts(self) -> (Record, Vec<ValidationError>) {
        (self.record, self.errors)
    }
}

/// Result of validating one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RowOutcome {
    /// Every field satisfied its rule.
    Valid(TypedRecord),
    /// At least one field violated its rule.
    Invalid(InvalidRow),
}

impl RowOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, RowOutcome::Valid(_))
    }

    /// Violations of this outcome (empty when valid).
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            RowOutcome::Valid(_) => &[],
            RowOutcome::Invalid(row) => row.errors(),
        }
    }
}

/// Validate one record against a schema, collecting every violation.
pub fn validate_record(schema: &RecordSchema, record: &Record) -> RowOutcome {
    let mut typed = Map::with_capacity(schema.len());
    let mut errors = Vec::new();

    for spec in schema.fields() {
        match check_field(spec, record.get(&spec.name)) {
            Ok(value) => {
                typed.insert(spec.name.clone(), value);
            }
            Err(error) => errors.push(error),
        }
    }

    if errors.is_empty() {
        RowOutcome::Valid(typed)
    } else {
        RowOutcome::Invalid(InvalidRow {
            record: record.clone(),
            errors,
        })
    }
}

/// Evaluate one field: presence, then coercion, then the constraint.
fn check_field(spec: &FieldSpec, raw: Option<&Value>) -> Result<Value, ValidationError> {
    match raw {
        Some(value) if !is_absent(raw) => rules::apply(&spec.name, &spec.rule, value),
        _ if spec.required => Err(ValidationError::new(
            &spec.name,
            ErrorKind::MissingRequiredField,
            format!("{} is required", spec.name),
        )),
        _ => Ok(Value::Null),
    }
}
