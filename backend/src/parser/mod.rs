//! Dataset source: CSV or JSON input to canonical records.
//!
//! CSV files are decoded with encoding auto-detection, split with delimiter
//! auto-detection, then passed through the rename map and projected onto the
//! schema's fields. JSON input is an array of objects and goes through the
//! same rename/projection step.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::Record;
use crate::schema::RecordSchema;

/// Candidate delimiters, in tie-break order.
const DELIMITERS: [char; 4] = [';', ',', '\t', '|'];

/// Raw parse of a CSV file, before renaming.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Rows keyed by source column name
    pub records: Vec<Record>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Source column headers
    pub headers: Vec<String>,
}

/// Records ready for validation, with metadata about the input.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Records keyed by canonical field name, schema fields only
    pub records: Vec<Record>,
    /// Renamed records with every source column, for column checks
    pub source_records: Vec<Record>,
    /// Encoding of the input (`utf-8` for JSON)
    pub encoding: String,
    /// Delimiter, for CSV input
    pub delimiter: Option<char>,
    /// Source headers (CSV) before renaming
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => Ok(String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())),
        label => match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(enc) => {
                let (decoded, _, had_errors) = enc.decode(bytes);
                if had_errors {
                    return Err(CsvError::EncodingError(label.to_string()));
                }
                Ok(decoded.into_owned())
            }
            // Unknown label: best-effort UTF-8
            None => Ok(String::from_utf8_lossy(bytes).into_owned()),
        },
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = ',';
    let mut best_count = 0;

    for sep in DELIMITERS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// Cells are trimmed and empty cells become `null`. Short rows are padded
/// with `null`, extra cells are ignored.
///
/// # Example
/// ```ignore
/// let (headers, rows) = parse_csv_str("name;age\nAlice;30", ';')?;
/// assert_eq!(headers, vec!["name", "age"]);
/// assert_eq!(rows[0]["age"], "30");
/// ```
pub fn parse_csv_str(content: &str, delimiter: char) -> CsvResult<(Vec<String>, Vec<Record>)> {
    let content = content.trim_start_matches('\u{feff}');
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| parse_error(1, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let line = idx + 2;
        // Rows of empty cells are kept: they are records with every value absent
        let row = row.map_err(|e| parse_error(line, e))?;

        let record: Record = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = match row.get(i) {
                    Some(cell) if !cell.is_empty() => Value::String(cell.to_string()),
                    _ => Value::Null,
                };
                (header.clone(), value)
            })
            .collect();

        records.push(record);
    }

    Ok((headers, records))
}

fn parse_error(line: usize, err: csv::Error) -> CsvError {
    let line = err
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(line);
    CsvError::ParseError {
        line,
        message: err.to_string(),
    }
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(content.trim_start_matches('\u{feff}'));
    let (headers, records) = parse_csv_str(&content, delimiter)?;

    Ok(ParseResult {
        records,
        encoding,
        delimiter,
        headers,
    })
}

/// Parse a JSON array of objects.
pub fn parse_json_records(content: &str) -> CsvResult<Vec<Record>> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let value: Value =
        serde_json::from_str(content).map_err(|e| CsvError::JsonError(e.to_string()))?;

    let Value::Array(items) = value else {
        return Err(CsvError::JsonError("expected an array of objects".to_string()));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(obj) => Ok(obj),
            _ => Err(CsvError::JsonError(format!("item {} is not an object", i))),
        })
        .collect()
}

/// Apply the rename map. Columns without an entry keep their source name.
///
/// When `headers` is given (CSV input), a required schema field that no
/// column maps to is an error.
pub fn prepare_records(
    records: Vec<Record>,
    headers: Option<&[String]>,
    rename: &BTreeMap<String, String>,
    schema: &RecordSchema,
) -> CsvResult<Vec<Record>> {
    let canonical = |name: &str| -> String {
        rename.get(name).cloned().unwrap_or_else(|| name.to_string())
    };

    if let Some(headers) = headers {
        let available: Vec<String> = headers.iter().map(|h| canonical(h.as_str())).collect();
        if let Some(missing) = schema
            .fields()
            .iter()
            .find(|f| f.required && !available.contains(&f.name))
        {
            return Err(CsvError::MissingColumn(missing.name.clone()));
        }
    }

    Ok(records
        .into_iter()
        .map(|record| {
            record
                .into_iter()
                .map(|(key, value)| (canonical(key.as_str()), value))
                .collect()
        })
        .collect())
}

/// Keep only the schema's fields.
pub fn project_records(records: &[Record], schema: &RecordSchema) -> Vec<Record> {
    records
        .iter()
        .map(|record| {
            record
                .iter()
                .filter(|(name, _)| schema.contains(name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect::<Map<String, Value>>()
        })
        .collect()
}

/// Parse an uploaded or on-disk dataset into canonical records.
///
/// `is_json` selects the JSON reader; otherwise the bytes are read as CSV.
pub fn parse_dataset_bytes(
    bytes: &[u8],
    is_json: bool,
    rename: &BTreeMap<String, String>,
    schema: &RecordSchema,
) -> CsvResult<Dataset> {
    if is_json {
        let content = decode_content(bytes, "utf-8")?;
        let source_records = prepare_records(parse_json_records(&content)?, None, rename, schema)?;
        return Ok(Dataset {
            records: project_records(&source_records, schema),
            source_records,
            encoding: "utf-8".to_string(),
            delimiter: None,
            headers: Vec::new(),
        });
    }

    let parsed = parse_bytes_auto(bytes)?;
    let source_records = prepare_records(parsed.records, Some(&parsed.headers), rename, schema)?;

    Ok(Dataset {
        records: project_records(&source_records, schema),
        source_records,
        encoding: parsed.encoding,
        delimiter: Some(parsed.delimiter),
        headers: parsed.headers,
    })
}

/// Read a dataset file. Files ending in `.json` are read as JSON, anything
/// else as CSV.
pub fn read_dataset(
    path: &Path,
    rename: &BTreeMap<String, String>,
    schema: &RecordSchema,
) -> CsvResult<Dataset> {
    let bytes = std::fs::read(path)?;
    parse_dataset_bytes(&bytes, is_json_path(path), rename, schema)
}

/// Whether a path names a JSON file.
pub fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_rename_map;
    use std::io::Write;

    const AMAZON_CSV: &str = "\
index,Order ID,Date,Status,Qty,currency,Amount,ship-country
0,405-8078784-5731545,04-30-22,Cancelled,0,INR,647.62,IN
1,171-9198151-1101146,04-30-22,Shipped,1,INR,406.0,IN
2,,04-30-22,Shipped,1,,,IN
";

    #[test]
    fn test_simple_csv() {
        let (headers, rows) = parse_csv_str("name;age\nAlice;30\nBob;25", ';').unwrap();

        assert_eq!(headers, vec!["name", "age"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Alice");
        assert_eq!(rows[0]["age"], "30");
        assert_eq!(rows[1]["name"], "Bob");
    }

    #[test]
    fn test_quoted_values() {
        let csv = "name,value\n\"Doe, Jane\",\" Hello World \"";
        let (_, rows) = parse_csv_str(csv, ',').unwrap();

        assert_eq!(rows[0]["name"], "Doe, Jane");
        assert_eq!(rows[0]["value"], "Hello World");
    }

    #[test]
    fn test_empty_cells_are_null() {
        let (_, rows) = parse_csv_str("a;b;c\n1;;3\n4", ';').unwrap();

        assert_eq!(rows[0]["b"], Value::Null);
        assert_eq!(rows[1]["a"], "4");
        assert_eq!(rows[1]["c"], Value::Null);
    }

    #[test]
    fn test_blank_lines_skipped_empty_rows_kept() {
        let (_, rows) = parse_csv_str("a;b\n1;2\n\n3;4\n;\n", ';').unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2]["a"], Value::Null);
        assert_eq!(rows[2]["b"], Value::Null);
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_csv_str("", ';'), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_bytes_auto(b""), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_rename_and_project() {
        let parsed = parse_bytes_auto(AMAZON_CSV.as_bytes()).unwrap();
        assert_eq!(parsed.delimiter, ',');
        assert_eq!(parsed.records.len(), 3);

        let schema = RecordSchema::orders();
        let renamed = prepare_records(
            parsed.records,
            Some(&parsed.headers),
            &default_rename_map(),
            &schema,
        )
        .unwrap();

        // Renaming keeps unmapped source columns
        assert_eq!(renamed[0].len(), 8);
        assert_eq!(renamed[0]["Status"], "Cancelled");
        assert_eq!(renamed[0]["order_id"], "405-8078784-5731545");
        assert!(!renamed[0].contains_key("Order ID"));

        let records = project_records(&renamed, &schema);
        assert_eq!(records[0].len(), 6);
        assert_eq!(records[0]["order_id"], "405-8078784-5731545");
        assert_eq!(records[0]["ship_country"], "IN");
        assert_eq!(records[1]["amount"], "406.0");
        assert!(!records[0].contains_key("Status"));
        assert!(!records[0].contains_key("index"));
        assert_eq!(records[2]["order_id"], Value::Null);
    }

    #[test]
    fn test_missing_required_column() {
        let (headers, rows) = parse_csv_str("Order ID,Qty\nA1,2", ',').unwrap();
        let result = prepare_records(
            rows,
            Some(&headers),
            &default_rename_map(),
            &RecordSchema::orders(),
        );
        assert!(matches!(result, Err(CsvError::MissingColumn(c)) if c == "amount"));
    }

    #[test]
    fn test_json_records() {
        let json = r#"[{"order_id": "A1", "qty": 5, "extra": true}, {"qty": "x"}]"#;
        let dataset = parse_dataset_bytes(
            json.as_bytes(),
            true,
            &default_rename_map(),
            &RecordSchema::orders(),
        )
        .unwrap();

        assert_eq!(dataset.records.len(), 2);
        assert_eq!(dataset.records[0]["qty"], 5);
        assert!(!dataset.records[0].contains_key("extra"));
        assert_eq!(dataset.source_records[0]["extra"], true);
        assert_eq!(dataset.delimiter, None);
    }

    #[test]
    fn test_json_must_be_array_of_objects() {
        assert!(matches!(parse_json_records("{}"), Err(CsvError::JsonError(_))));
        assert!(matches!(parse_json_records("[1, 2]"), Err(CsvError::JsonError(_))));
        assert!(parse_json_records("[]").unwrap().is_empty());
    }

    #[test]
    fn test_read_dataset_from_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(AMAZON_CSV.as_bytes()).unwrap();

        let dataset =
            read_dataset(file.path(), &default_rename_map(), &RecordSchema::orders()).unwrap();
        assert_eq!(dataset.records.len(), 3);
        assert_eq!(dataset.encoding, "utf-8");
        assert_eq!(dataset.headers[1], "Order ID");
    }

    #[test]
    fn test_read_dataset_missing_file() {
        let result = read_dataset(
            Path::new("/nonexistent/orders.csv"),
            &default_rename_map(),
            &RecordSchema::orders(),
        );
        assert!(matches!(result, Err(CsvError::IoError(_))));
    }

    #[test]
    fn test_is_json_path() {
        assert!(is_json_path(Path::new("rows.JSON")));
        assert!(!is_json_path(Path::new("rows.csv")));
        assert!(!is_json_path(Path::new("rows")));
    }
}
