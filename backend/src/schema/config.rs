//! Serializable form of a record schema.
//!
//! Rules in a config file may inline their parameters or refer to entries
//! of the `constants` / `sets` tables by name. Names are resolved when the
//! config is turned into a [`super::RecordSchema`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{FieldRule, ORDER_DATE_PATTERN};
use crate::error::{SchemaError, SchemaResult};

/// Schema as found in a JSON config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Named scalar constants for `exact_match` rules
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constants: BTreeMap<String, String>,

    /// Named value sets for `value_in_set` rules
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sets: BTreeMap<String, Vec<String>>,

    /// Fields in validation order
    pub fields: Vec<FieldConfig>,
}

/// One field entry of a [`SchemaConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    pub rule: RuleConfig,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// Rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleConfig {
    NonEmptyString,

    NonNegativeInteger,

    NonNegativeNumber,

    /// Exactly one of `value` (literal) or `constant` (name in `constants`).
    ExactMatch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        constant: Option<String>,
    },

    /// Exactly one of `values` (literal) or `set` (name in `sets`).
    ValueInSet {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        values: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        set: Option<String>,
    },

    DateFormat {
        pattern: String,
    },
}

impl RuleConfig {
    /// Resolve named references against the schema's constant tables.
    pub fn resolve(&self, field: &str, config: &SchemaConfig) -> SchemaResult<FieldRule> {
        let malformed = |message: &str| SchemaError::MalformedRule {
            field: field.to_string(),
            message: message.to_string(),
        };
        let undefined = |name: &str| SchemaError::UndefinedConstant {
            field: field.to_string(),
            name: name.to_string(),
        };

        match self {
            RuleConfig::NonEmptyString => Ok(FieldRule::NonEmptyString),
            RuleConfig::NonNegativeInteger => Ok(FieldRule::NonNegativeInteger),
            RuleConfig::NonNegativeNumber => Ok(FieldRule::NonNegativeNumber),

            RuleConfig::ExactMatch { value, constant } => match (value, constant) {
                (Some(value), None) => Ok(FieldRule::ExactMatch(value.clone())),
                (None, Some(name)) => config
                    .constants
                    .get(name)
                    .map(|value| FieldRule::ExactMatch(value.clone()))
                    .ok_or_else(|| undefined(name)),
                _ => Err(malformed("exact_match needs exactly one of 'value' or 'constant'")),
            },

            RuleConfig::ValueInSet { values, set } => match (values, set) {
                (Some(values), None) => Ok(FieldRule::ValueInSet(values.clone())),
                (None, Some(name)) => config
                    .sets
                    .get(name)
                    .map(|values| FieldRule::ValueInSet(values.clone()))
                    .ok_or_else(|| undefined(name)),
                _ => Err(malformed("value_in_set needs exactly one of 'values' or 'set'")),
            },

            RuleConfig::DateFormat { pattern } => Ok(FieldRule::DateFormat(pattern.clone())),
        }
    }
}

impl SchemaConfig {
    /// Configuration of the built-in order export schema.
    pub fn orders() -> Self {
        let field = |name: &str, rule: RuleConfig| FieldConfig {
            name: name.to_string(),
            rule,
            required: true,
        };
        let constant = |name: &str| RuleConfig::ExactMatch {
            value: None,
            constant: Some(name.to_string()),
        };

        Self {
            constants: BTreeMap::from([
                ("currency".to_string(), "INR".to_string()),
                ("ship_country".to_string(), "IN".to_string()),
            ]),
            sets: BTreeMap::new(),
            fields: vec![
                field("order_id", RuleConfig::NonEmptyString),
                field("qty", RuleConfig::NonNegativeInteger),
                field("amount", RuleConfig::NonNegativeNumber),
                field("currency", constant("currency")),
                field("ship_country", constant("ship_country")),
                field(
                    "date",
                    RuleConfig::DateFormat {
                        pattern: ORDER_DATE_PATTERN.to_string(),
                    },
                ),
            ],
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self::orders()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RecordSchema;

    #[test]
    fn test_parse_config_json() {
        let json = r#"{
            "sets": { "countries": ["IN", "US"] },
            "fields": [
                { "name": "order_id", "rule": { "type": "non_empty_string" } },
                { "name": "ship_country", "rule": { "type": "value_in_set", "set": "countries" } },
                { "name": "note", "rule": { "type": "non_empty_string" }, "required": false }
            ]
        }"#;

        let config: SchemaConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.fields.len(), 3);
        assert!(config.fields[0].required);
        assert!(!config.fields[2].required);

        let schema = RecordSchema::from_config(&config).unwrap();
        assert_eq!(
            schema.get("ship_country").map(|f| &f.rule),
            Some(&FieldRule::ValueInSet(vec!["IN".into(), "US".into()]))
        );
    }

    #[test]
    fn test_undefined_constant() {
        let mut config = SchemaConfig::orders();
        config.constants.remove("currency");

        let err = RecordSchema::from_config(&config).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UndefinedConstant {
                field: "currency".into(),
                name: "currency".into(),
            }
        );
    }

    #[test]
    fn test_undefined_set() {
        let config = SchemaConfig {
            constants: BTreeMap::new(),
            sets: BTreeMap::new(),
            fields: vec![FieldConfig {
                name: "ship_country".into(),
                rule: RuleConfig::ValueInSet {
                    values: None,
                    set: Some("countries".into()),
                },
                required: true,
            }],
        };

        assert!(matches!(
            RecordSchema::from_config(&config),
            Err(SchemaError::UndefinedConstant { name, .. }) if name == "countries"
        ));
    }

    #[test]
    fn test_exact_match_needs_one_source() {
        let rule = RuleConfig::ExactMatch {
            value: Some("INR".into()),
            constant: Some("currency".into()),
        };
        let result = rule.resolve("currency", &SchemaConfig::orders());
        assert!(matches!(result, Err(SchemaError::MalformedRule { .. })));

        let rule = RuleConfig::ExactMatch {
            value: None,
            constant: None,
        };
        let result = rule.resolve("currency", &SchemaConfig::orders());
        assert!(matches!(result, Err(SchemaError::MalformedRule { .. })));
    }

    #[test]
    fn test_duplicate_field_in_config() {
        let mut config = SchemaConfig::orders();
        let duplicate = config.fields[0].clone();
        config.fields.push(duplicate);

        assert_eq!(
            RecordSchema::from_config(&config),
            Err(SchemaError::DuplicateField("order_id".into()))
        );
    }

    #[test]
    fn test_serialized_rule_tag() {
        let json = serde_json::to_value(&SchemaConfig::orders()).unwrap();
        assert_eq!(json["fields"][3]["rule"]["type"], "exact_match");
        assert_eq!(json["fields"][3]["rule"]["constant"], "currency");
        assert!(json["fields"][3]["rule"].get("value").is_none());
    }
}
