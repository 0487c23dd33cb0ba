//! Record representations shared by the source, validator and sink.
//!
//! Records travel through the pipeline as JSON object maps keyed by
//! canonical field name, the same shape the dataset source produces.

use serde_json::{Map, Value};

/// A record as read from the dataset source, after column renaming.
///
/// Values are untyped: strings from CSV cells, numbers from JSON input,
/// or `null` for empty cells. A missing key and `null` both mean "absent".
pub type Record = Map<String, Value>;

/// A record that passed validation, with numeric fields coerced
/// and string fields trimmed.
pub type TypedRecord = Map<String, Value>;

/// Check whether a raw value counts as absent.
pub fn is_absent(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Render a value as a flat text cell (CSV output, set membership, messages).
///
/// Strings are returned verbatim, `null` becomes the empty string and
/// everything else uses its JSON rendering.
pub fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
