//! Declarative record schema.
//!
//! A [`RecordSchema`] is an ordered list of [`FieldSpec`]s, each attaching
//! one [`FieldRule`] to one canonical field name. Field order only fixes the
//! order in which violations are reported.
//!
//! # Example
//!
//! ```rust,ignore
//! use orderguard::schema::{FieldRule, FieldSpec, RecordSchema};
//!
//! let schema = RecordSchema::new(vec![
//!     FieldSpec::required("order_id", FieldRule::NonEmptyString),
//!     FieldSpec::required("qty", FieldRule::NonNegativeInteger),
//! ])?;
//! let outcome = schema.validate(&record);
//! ```

pub mod config;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt::Write as _;

use crate::error::{SchemaError, SchemaResult};
use crate::models::Record;
use crate::validation::{validate_record, RowOutcome};

pub use config::{FieldConfig, RuleConfig, SchemaConfig};

/// Date pattern used by the order exports (`04-25-22`).
pub const ORDER_DATE_PATTERN: &str = "%m-%d-%y";

/// A single constraint on one field's value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRule {
    /// Text that is not blank after trimming.
    NonEmptyString,

    /// Integer >= 0.
    NonNegativeInteger,

    /// Number >= 0.
    NonNegativeNumber,

    /// Text equal to a constant (case-sensitive).
    ExactMatch(String),

    /// Text that is one of the allowed values.
    ValueInSet(Vec<String>),

    /// Text that parses as a calendar date with a strftime pattern.
    DateFormat(String),
}

impl FieldRule {
    /// Short name of the rule, as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            FieldRule::NonEmptyString => "non_empty_string",
            FieldRule::NonNegativeInteger => "non_negative_integer",
            FieldRule::NonNegativeNumber => "non_negative_number",
            FieldRule::ExactMatch(_) => "exact_match",
            FieldRule::ValueInSet(_) => "value_in_set",
            FieldRule::DateFormat(_) => "date_format",
        }
    }

    /// Check the rule's own parameters.
    fn check(&self, field: &str) -> SchemaResult<()> {
        let malformed = |message: &str| SchemaError::MalformedRule {
            field: field.to_string(),
            message: message.to_string(),
        };

        match self {
            FieldRule::ValueInSet(values) if values.is_empty() => {
                Err(malformed("allowed set is empty"))
            }
            FieldRule::DateFormat(pattern) if pattern.trim().is_empty() => {
                Err(malformed("date pattern is empty"))
            }
            FieldRule::DateFormat(pattern) if !is_valid_strftime(pattern) => {
                Err(malformed(&format!("invalid date pattern '{}'", pattern)))
            }
            FieldRule::DateFormat(pattern) if !parses_calendar_date(pattern) => Err(malformed(
                &format!("date pattern '{}' cannot parse a calendar date", pattern),
            )),
            _ => Ok(()),
        }
    }
}

fn is_valid_strftime(pattern: &str) -> bool {
    StrftimeItems::new(pattern).all(|item| !matches!(item, Item::Error))
}

/// A pattern must carry a full date: a known day formatted with it has to
/// parse back to the same day.
fn parses_calendar_date(pattern: &str) -> bool {
    let Some(sample) = NaiveDate::from_ymd_opt(2022, 4, 25) else {
        return false;
    };
    let Some(stamp) = sample.and_hms_opt(13, 45, 30) else {
        return false;
    };

    let mut text = String::new();
    if write!(text, "{}", stamp.format(pattern)).is_err() {
        return false;
    }
    NaiveDate::parse_from_str(&text, pattern) == Ok(sample)
}

/// One field of a record schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Canonical field name
    pub name: String,
    /// Constraint applied to the value
    pub rule: FieldRule,
    /// Whether an absent value is a violation
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, rule: FieldRule, required: bool) -> Self {
        Self {
            name: name.into(),
            rule,
            required,
        }
    }

    pub fn required(name: impl Into<String>, rule: FieldRule) -> Self {
        Self::new(name, rule, true)
    }

    pub fn optional(name: impl Into<String>, rule: FieldRule) -> Self {
        Self::new(name, rule, false)
    }
}

/// Ordered, immutable set of field specs with unique names.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    fields: Vec<FieldSpec>,
}

impl RecordSchema {
    /// Build a schema, rejecting duplicate names and malformed rules.
    pub fn new(fields: Vec<FieldSpec>) -> SchemaResult<Self> {
        let mut seen = HashSet::new();

        for spec in &fields {
            if spec.name.trim().is_empty() {
                return Err(SchemaError::MalformedRule {
                    field: spec.name.clone(),
                    message: "field name is empty".to_string(),
                });
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(SchemaError::DuplicateField(spec.name.clone()));
            }
            spec.rule.check(&spec.name)?;
        }

        Ok(Self { fields })
    }

    /// Build a schema from its configuration form, resolving named constants.
    pub fn from_config(config: &SchemaConfig) -> SchemaResult<Self> {
        let fields = config
            .fields
            .iter()
            .map(|field| {
                let rule = field.rule.resolve(&field.name, config)?;
                Ok(FieldSpec::new(field.name.clone(), rule, field.required))
            })
            .collect::<SchemaResult<Vec<_>>>()?;

        Self::new(fields)
    }

    /// The built-in order export schema.
    pub fn orders() -> Self {
        Self {
            fields: vec![
                FieldSpec::required("order_id", FieldRule::NonEmptyString),
                FieldSpec::required("qty", FieldRule::NonNegativeInteger),
                FieldSpec::required("amount", FieldRule::NonNegativeNumber),
                FieldSpec::required("currency", FieldRule::ExactMatch("INR".to_string())),
                FieldSpec::required("ship_country", FieldRule::ExactMatch("IN".to_string())),
                FieldSpec::required("date", FieldRule::DateFormat(ORDER_DATE_PATTERN.to_string())),
            ],
        }
    }

    /// Field specs in schema order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Field names in schema order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Look up a field spec by name.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate one record against this schema.
    pub fn validate(&self, record: &Record) -> RowOutcome {
        validate_record(self, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_schema_matches_config() {
        let from_config = RecordSchema::from_config(&SchemaConfig::orders()).unwrap();
        assert_eq!(from_config, RecordSchema::orders());
    }

    #[test]
    fn test_orders_schema_is_accepted_by_new() {
        let fields = RecordSchema::orders().fields().to_vec();
        assert!(RecordSchema::new(fields).is_ok());
    }

    #[test]
    fn test_field_order_preserved() {
        let schema = RecordSchema::orders();
        let names: Vec<&str> = schema.field_names().collect();
        assert_eq!(
            names,
            vec!["order_id", "qty", "amount", "currency", "ship_country", "date"]
        );
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = RecordSchema::new(vec![
            FieldSpec::required("qty", FieldRule::NonNegativeInteger),
            FieldSpec::optional("qty", FieldRule::NonNegativeNumber),
        ]);
        assert_eq!(result, Err(SchemaError::DuplicateField("qty".into())));
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = RecordSchema::new(vec![FieldSpec::required(" ", FieldRule::NonEmptyString)]);
        assert!(matches!(result, Err(SchemaError::MalformedRule { .. })));
    }

    #[test]
    fn test_empty_set_rejected() {
        let result = RecordSchema::new(vec![FieldSpec::required(
            "ship_country",
            FieldRule::ValueInSet(vec![]),
        )]);
        assert!(matches!(result, Err(SchemaError::MalformedRule { field, .. }) if field == "ship_country"));
    }

    #[test]
    fn test_bad_date_pattern_rejected() {
        let result = RecordSchema::new(vec![FieldSpec::required(
            "date",
            FieldRule::DateFormat("%m-%d-%".into()),
        )]);
        assert!(matches!(result, Err(SchemaError::MalformedRule { .. })));

        let result = RecordSchema::new(vec![FieldSpec::required(
            "date",
            FieldRule::DateFormat("".into()),
        )]);
        assert!(matches!(result, Err(SchemaError::MalformedRule { .. })));
    }

    #[test]
    fn test_date_pattern_needs_full_date() {
        for pattern in ["%H:%M", "%m-%d", "%Y"] {
            let result = RecordSchema::new(vec![FieldSpec::required(
                "date",
                FieldRule::DateFormat(pattern.into()),
            )]);
            match result {
                Err(SchemaError::MalformedRule { message, .. }) => {
                    assert!(message.contains("cannot parse a calendar date"), "{pattern}: {message}");
                }
                other => panic!("{pattern} accepted: {other:?}"),
            }
        }

        for pattern in ["%m-%d-%y", "%Y-%m-%d", "%d/%m/%Y %H:%M"] {
            let result = RecordSchema::new(vec![FieldSpec::required(
                "date",
                FieldRule::DateFormat(pattern.into()),
            )]);
            assert!(result.is_ok(), "{pattern} rejected");
        }
    }

    #[test]
    fn test_lookup() {
        let schema = RecordSchema::orders();
        assert_eq!(schema.len(), 6);
        assert!(schema.contains("ship_country"));
        assert!(!schema.contains("status"));
        assert_eq!(schema.get("qty").map(|f| f.rule.name()), Some("non_negative_integer"));
    }
}
