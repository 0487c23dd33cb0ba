//! REST API types.
//!
//! Field names are camelCase on the wire.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::batch::BatchSummary;
use crate::columns::ColumnReport;
use crate::parser::Dataset;
use crate::pipeline::Validated;
use crate::validation::ValidationError;

/// Invalid rows listed in a response; the summary still counts all of them.
pub const MAX_LISTED_INVALID: usize = 100;

/// Response to a dataset upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    /// Unique job identifier
    pub job_id: String,

    /// "passed" or "failed"
    pub status: String,

    pub summary: BatchSummary,

    /// First invalid rows, by input position
    pub invalid: Vec<InvalidEntry>,

    /// Column check results, when configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnReport>,

    /// Source file metadata
    pub dataset: DatasetMetadata,

    /// Plain-text report, as sent to the notification channel
    pub report: String,
}

/// One invalid row in a response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidEntry {
    /// 0-based position in the uploaded dataset
    pub index: usize,
    pub errors: Vec<ValidationError>,
}

/// Uploaded file metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata {
    pub encoding: String,
    /// `None` for JSON uploads
    pub delimiter: Option<String>,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl ValidateResponse {
    pub fn new(dataset: &Dataset, validated: Validated) -> Self {
        let Validated {
            batch,
            columns,
            report,
        } = validated;

        let invalid = batch
            .invalid_indices
            .iter()
            .zip(batch.invalid)
            .take(MAX_LISTED_INVALID)
            .map(|(&index, row)| InvalidEntry {
                index,
                errors: row.into_parts().1,
            })
            .collect();

        ValidateResponse {
            job_id: Uuid::new_v4().to_string(),
            status: if batch.summary.passed() { "passed" } else { "failed" }.to_string(),
            summary: batch.summary,
            invalid,
            columns,
            dataset: DatasetMetadata {
                encoding: dataset.encoding.clone(),
                delimiter: dataset.delimiter.map(|d| d.to_string()),
                row_count: dataset.records.len(),
                columns: dataset.headers.clone(),
            },
            report,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "invalid": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::models::Record;
    use crate::pipeline::validate_dataset;
    use crate::schema::RecordSchema;

    fn dataset(records: Vec<Record>) -> Dataset {
        Dataset {
            source_records: records.clone(),
            records,
            encoding: "utf-8".to_string(),
            delimiter: Some(','),
            headers: vec!["Order ID".to_string()],
        }
    }

    fn order(id: &str, qty: i64) -> Record {
        json!({
            "order_id": id, "qty": qty, "amount": 10.0,
            "currency": "INR", "ship_country": "IN", "date": "04-25-22"
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_failed_response_shape() {
        let data = dataset(vec![order("A1", 1), order("A2", -1), order("A3", 2)]);
        let validated = validate_dataset(&data, &RecordSchema::orders(), &PipelineConfig::default());

        let response = ValidateResponse::new(&data, validated);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "failed");
        assert_eq!(json["summary"]["invalid"], 1);
        assert_eq!(json["invalid"][0]["index"], 1);
        assert_eq!(json["invalid"][0]["errors"][0]["kind"], "RangeError");
        assert_eq!(json["dataset"]["delimiter"], ",");
        assert!(json["jobId"].is_string());
        assert!(json.get("columns").is_none());
        assert!(json["report"].as_str().unwrap().contains("Invalid rows: 1"));
    }

    #[test]
    fn test_invalid_listing_is_capped() {
        let records: Vec<Record> = (0..150).map(|i| order(&format!("X{i}"), -1)).collect();
        let data = dataset(records);
        let validated = validate_dataset(&data, &RecordSchema::orders(), &PipelineConfig::default());

        let response = ValidateResponse::new(&data, validated);
        assert_eq!(response.invalid.len(), MAX_LISTED_INVALID);
        assert_eq!(response.summary.invalid, 150);
        assert_eq!(response.invalid[99].index, 99);
    }

    #[test]
    fn test_passed_response() {
        let data = dataset(vec![order("A1", 1)]);
        let validated = validate_dataset(&data, &RecordSchema::orders(), &PipelineConfig::default());

        let response = ValidateResponse::new(&data, validated);
        assert_eq!(response.status, "passed");
        assert!(response.invalid.is_empty());
    }

    #[test]
    fn test_error_response() {
        let json = error_response("No file provided");
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "No file provided");
    }
}
