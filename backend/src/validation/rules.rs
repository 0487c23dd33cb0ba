//! Coercion and constraint checks for each [`FieldRule`].

use chrono::NaiveDate;
use serde_json::Value;

use super::{ErrorKind, ValidationError};
use crate::models::value_to_cell;
use crate::schema::FieldRule;

/// Coerce a present value for `rule` and check the constraint.
///
/// Returns the typed value to store in a valid record.
pub(super) fn apply(field: &str, rule: &FieldRule, raw: &Value) -> Result<Value, ValidationError> {
    match rule {
        FieldRule::NonEmptyString => {
            let text = coerce_string(field, raw)?;
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::new(
                    field,
                    ErrorKind::EmptyStringError,
                    format!("{} cannot be empty", field),
                ));
            }
            Ok(Value::String(trimmed.to_string()))
        }

        FieldRule::NonNegativeInteger => {
            let n = coerce_integer(field, raw)?;
            if n < 0 {
                return Err(range_error(field));
            }
            u64::try_from(n).map(Value::from).map_err(|_| {
                ValidationError::new(
                    field,
                    ErrorKind::RangeError,
                    format!("{} must be <= {}", field, u64::MAX),
                )
            })
        }

        FieldRule::NonNegativeNumber => {
            let n = coerce_number(field, raw)?;
            if n < 0.0 {
                return Err(range_error(field));
            }
            Ok(Value::from(n))
        }

        FieldRule::ExactMatch(expected) => {
            let text = coerce_string(field, raw)?;
            if text != *expected {
                return Err(ValidationError::new(
                    field,
                    ErrorKind::ConstantMismatchError,
                    format!("{} must be '{}'", field, expected),
                ));
            }
            Ok(Value::String(text.trim().to_string()))
        }

        FieldRule::ValueInSet(allowed) => {
            let text = coerce_string(field, raw)?;
            if !allowed.iter().any(|v| *v == text) {
                return Err(ValidationError::new(
                    field,
                    ErrorKind::ValueNotAllowedError,
                    format!("{} must be one of [{}]", field, allowed.join(", ")),
                ));
            }
            Ok(Value::String(text.trim().to_string()))
        }

        FieldRule::DateFormat(pattern) => {
            let text = coerce_string(field, raw)?;
            if NaiveDate::parse_from_str(&text, pattern).is_err() {
                return Err(ValidationError::new(
                    field,
                    ErrorKind::DateFormatError,
                    format!("{} must match format {}", field, pattern),
                ));
            }
            Ok(Value::String(text.trim().to_string()))
        }
    }
}

fn range_error(field: &str) -> ValidationError {
    ValidationError::new(field, ErrorKind::RangeError, format!("{} must be >= 0", field))
}

fn coercion_error(field: &str, expected: &str, raw: &Value) -> ValidationError {
    ValidationError::new(
        field,
        ErrorKind::TypeCoercionError,
        format!("{} must be {}, got '{}'", field, expected, value_to_cell(raw)),
    )
}

/// Strings as-is, numbers in their decimal form. Anything else is rejected.
fn coerce_string(field: &str, raw: &Value) -> Result<String, ValidationError> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(coercion_error(field, "a string", other)),
    }
}

/// Integers, integral floats (`5.0`), and strings holding either.
fn coerce_integer(field: &str, raw: &Value) -> Result<i128, ValidationError> {
    let parsed = match raw {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i128>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    };

    parsed.ok_or_else(|| coercion_error(field, "an integer", raw))
}

/// Finite numbers and strings holding one.
fn coerce_number(field: &str, raw: &Value) -> Result<f64, ValidationError> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| coercion_error(field, "a number", raw))
}

/// Whole floats. Out-of-range values saturate and fail the range check.
fn integral(n: f64) -> Option<i128> {
    if n.is_finite() && n.fract() == 0.0 {
        Some(n as i128)
    } else {
        None
    }
}
