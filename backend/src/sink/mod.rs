//! Dataset sink: persist the valid and invalid partitions.
//!
//! CSV output uses the schema's field order for columns. The invalid file
//! gets one extra `error` column with the row's joined messages. Paths
//! ending in `.json` are written as pretty-printed JSON arrays instead.

use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::SinkResult;
use crate::models::{value_to_cell, Record, TypedRecord};
use crate::parser::is_json_path;
use crate::schema::RecordSchema;
use crate::validation::InvalidRow;

/// Name of the column carrying the joined error messages.
pub const ERROR_COLUMN: &str = "error";

/// Write the valid partition.
pub fn write_valid(path: &Path, schema: &RecordSchema, rows: &[TypedRecord]) -> SinkResult<()> {
    ensure_parent(path)?;

    if is_json_path(path) {
        return write_json(path, rows);
    }

    let headers: Vec<&str> = schema.field_names().collect();
    let cells = rows.iter().map(|row| record_cells(row, &headers));
    write_csv(path, &headers, cells)
}

/// Write the invalid partition, with an `error` column.
pub fn write_invalid(path: &Path, schema: &RecordSchema, rows: &[InvalidRow]) -> SinkResult<()> {
    ensure_parent(path)?;

    if is_json_path(path) {
        let annotated: Vec<Record> = rows
            .iter()
            .map(|row| {
                let mut record = row.record().clone();
                record.insert(ERROR_COLUMN.to_string(), Value::String(row.joined_errors()));
                record
            })
            .collect();
        return write_json(path, &annotated);
    }

    let fields: Vec<&str> = schema.field_names().collect();
    let mut headers = fields.clone();
    headers.push(ERROR_COLUMN);

    let cells = rows.iter().map(|row| {
        let mut cells = record_cells(row.record(), &fields);
        cells.push(row.joined_errors());
        cells
    });
    write_csv(path, &headers, cells)
}

fn record_cells(record: &Record, fields: &[&str]) -> Vec<String> {
    fields
        .iter()
        .map(|f| record.get(*f).map(value_to_cell).unwrap_or_default())
        .collect()
}

fn write_csv<I>(path: &Path, headers: &[&str], rows: I) -> SinkResult<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(path: &Path, rows: &[Record]) -> SinkResult<()> {
    let json = serde_json::to_string_pretty(rows)?;
    fs::write(path, json)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> SinkResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
