//! Pipeline configuration.
//!
//! One [`PipelineConfig`] is built at the program boundary and passed by
//! reference to everything that needs it. Sources, lowest precedence first:
//!
//! 1. Built-in defaults (the order export schema)
//! 2. A JSON config file
//! 3. Environment variables (a `.env` file is loaded if present)
//!
//! CLI flags are applied on top by the binary.
//!
//! # Environment
//!
//! | Variable                  | Effect                              |
//! |---------------------------|-------------------------------------|
//! | `SLACK_WEBHOOK_URL`       | Webhook for run notifications       |
//! | `ORDERGUARD_PREVIEW_SIZE` | Invalid rows shown in the summary   |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::batch::DEFAULT_PREVIEW_SIZE;
use crate::columns::ColumnCheck;
use crate::error::{ConfigError, ConfigResult, SchemaResult};
use crate::report::ReportOptions;
use crate::schema::{RecordSchema, SchemaConfig};

pub const ENV_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";
pub const ENV_PREVIEW_SIZE: &str = "ORDERGUARD_PREVIEW_SIZE";

/// Everything a validation run needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fields and rules
    pub schema: SchemaConfig,

    /// Source column name -> canonical field name
    pub rename: BTreeMap<String, String>,

    /// Invalid rows previewed in the summary
    pub preview_size: usize,

    /// Include the rule histogram in the report
    pub include_histogram: bool,

    /// Whole-column checks run after the row-level pass
    pub column_checks: Vec<ColumnCheck>,

    /// Notification webhook. Never written back out.
    #[serde(skip_serializing)]
    pub webhook_url: Option<String>,
}

/// Column names used by the order exports.
pub fn default_rename_map() -> BTreeMap<String, String> {
    [
        ("Order ID", "order_id"),
        ("Qty", "qty"),
        ("Amount", "amount"),
        ("currency", "currency"),
        ("ship-country", "ship_country"),
        ("Date", "date"),
    ]
    .into_iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            schema: SchemaConfig::orders(),
            rename: default_rename_map(),
            preview_size: DEFAULT_PREVIEW_SIZE,
            include_histogram: true,
            column_checks: Vec::new(),
            webhook_url: None,
        }
    }
}

impl PipelineConfig {
    /// Parse a config from JSON. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Defaults or file, then environment overrides.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env_vars(|name| env::var(name).ok())
    }

    /// Apply environment overrides read through `lookup`.
    pub fn with_env_vars<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_WEBHOOK_URL).filter(|u| !u.trim().is_empty()) {
            self.webhook_url = Some(url);
        }

        if let Some(raw) = lookup(ENV_PREVIEW_SIZE) {
            self.preview_size = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_PREVIEW_SIZE.to_string(),
                value: raw.clone(),
            })?;
        }

        Ok(self)
    }

    /// Build the record schema described by this config.
    pub fn build_schema(&self) -> SchemaResult<RecordSchema> {
        RecordSchema::from_config(&self.schema)
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            include_histogram: self.include_histogram,
            preview_size: self.preview_size,
        }
    }

    /// Pretty JSON of the effective configuration (webhook omitted).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.preview_size, 3);
        assert!(config.include_histogram);
        assert!(config.column_checks.is_empty());
        assert_eq!(config.rename["ship-country"], "ship_country");
        assert_eq!(config.build_schema().unwrap(), RecordSchema::orders());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = PipelineConfig::from_json(r#"{ "preview_size": 5 }"#).unwrap();
        assert_eq!(config.preview_size, 5);
        assert_eq!(config.schema, SchemaConfig::orders());
        assert_eq!(config.rename, default_rename_map());
    }

    #[test]
    fn test_full_file() {
        let json = r#"{
            "schema": {
                "sets": { "countries": ["IN", "US"] },
                "fields": [
                    { "name": "order_id", "rule": { "type": "non_empty_string" } },
                    { "name": "ship_country", "rule": { "type": "value_in_set", "set": "countries" } }
                ]
            },
            "rename": { "Order ID": "order_id", "ship-country": "ship_country" },
            "include_histogram": false,
            "column_checks": [ { "check": "unique", "column": "order_id" } ]
        }"#;

        let config = PipelineConfig::from_json(json).unwrap();
        assert!(!config.include_histogram);
        assert_eq!(config.column_checks.len(), 1);
        assert_eq!(config.build_schema().unwrap().len(), 2);
    }

    #[test]
    fn test_bundled_config_matches_defaults() {
        let config = PipelineConfig::from_json(include_str!("../../../config/orders.json")).unwrap();
        assert_eq!(config.schema, SchemaConfig::orders());
        assert_eq!(config.rename, default_rename_map());
        assert_eq!(config.column_checks.len(), 6);
        assert_eq!(config.column_checks[5].column(), "Status");
    }

    #[test]
    fn test_bad_schema_in_file() {
        let json = r#"{
            "schema": {
                "fields": [
                    { "name": "currency", "rule": { "type": "exact_match", "constant": "nope" } }
                ]
            }
        }"#;

        let config = PipelineConfig::from_json(json).unwrap();
        assert!(matches!(
            config.build_schema(),
            Err(SchemaError::UndefinedConstant { .. })
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            PipelineConfig::from_json("{ not json"),
            Err(ConfigError::JsonError(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars = HashMap::from([
            (ENV_WEBHOOK_URL, "https://hooks.example.com/abc"),
            (ENV_PREVIEW_SIZE, "10"),
        ]);

        let config = PipelineConfig::default()
            .with_env_vars(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.webhook_url.as_deref(), Some("https://hooks.example.com/abc"));
        assert_eq!(config.preview_size, 10);
    }

    #[test]
    fn test_bad_env_value() {
        let result = PipelineConfig::default().with_env_vars(|name| {
            (name == ENV_PREVIEW_SIZE).then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));
    }

    #[test]
    fn test_webhook_never_serialized() {
        let config = PipelineConfig {
            webhook_url: Some("https://hooks.example.com/secret".into()),
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"preview_size\": 3"));
    }
}
