//! Result-set normalization.
//!
//! Raw driver results arrive in whatever shape the backend produced: mapped
//! rows, positional rows, sometimes without usable column metadata. This
//! module flattens all of that into display-safe records: binary cells are
//! redacted, oversized strings truncated, and opaque payload columns dropped
//! by a name denylist unless the caller asked for columns explicitly.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

/// Marker substituted for any byte-valued cell.
pub const BINARY_MARKER: &str = "<binary data>";

/// Display cap for string cells, in characters.
pub const MAX_TEXT_LEN: usize = 200;

lazy_static! {
    /// Column names that look like opaque binary payloads; useless in a
    /// tabular UI and dropped when no explicit column list was given.
    static ref EXCLUDE_COLUMNS: Regex =
        Regex::new(r"(?i)blob|binary|file|attachment|pdf|document|image|base64|content")
            .expect("invalid exclude pattern");
}

/// An owned scalar as decoded from the database driver.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(Value),
}

/// One raw row: either already keyed by column name, or positional values to
/// be zipped against the result set's column list.
#[derive(Debug, Clone)]
pub enum RawRow {
    Mapped(Vec<(String, CellValue)>),
    Positional(Vec<CellValue>),
}

/// An eagerly fetched result set. `columns` may be empty when the driver
/// exposed no metadata; labels are synthesized in that case.
#[derive(Debug, Clone, Default)]
pub struct RawResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// A flat, display-safe record. Insertion order is column order.
pub type NormalizedRecord = serde_json::Map<String, Value>;

/// Normalize a raw result set into flat records.
///
/// `keep_columns` takes precedence over the denylist heuristic: it is
/// intersected with the actually-present columns, in the requested order.
pub fn normalize(result: RawResultSet, keep_columns: Option<&[String]>) -> Vec<NormalizedRecord> {
    if result.rows.is_empty() {
        return Vec::new();
    }

    let mut records = Vec::with_capacity(result.rows.len());
    for row in result.rows {
        records.push(normalize_row(row, &result.columns, keep_columns));
    }
    records
}

fn normalize_row(
    row: RawRow,
    columns: &[String],
    keep_columns: Option<&[String]>,
) -> NormalizedRecord {
    let pairs: Vec<(String, CellValue)> = match row {
        RawRow::Mapped(pairs) => pairs,
        RawRow::Positional(values) => {
            if columns.is_empty() {
                // No metadata at all: synthesize positional labels.
                values
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (format!("column_{}", i + 1), v))
                    .collect()
            } else if values.len() == columns.len() {
                columns.iter().cloned().zip(values).collect()
            } else {
                // Shape mismatch: degrade this row instead of failing the
                // whole request.
                warn!(
                    expected = columns.len(),
                    got = values.len(),
                    "row shape mismatch, falling back to string representation"
                );
                let mut record = NormalizedRecord::new();
                record.insert("result".to_string(), Value::String(render_row(&values)));
                return record;
            }
        }
    };

    let mut record = NormalizedRecord::new();
    match keep_columns {
        Some(keep) => {
            // Explicit request wins over the heuristic; requested order.
            for wanted in keep {
                if let Some((name, value)) = pairs.iter().find(|(name, _)| name == wanted) {
                    record.insert(name.clone(), display_value(value.clone()));
                }
            }
        }
        None => {
            for (name, value) in pairs {
                if EXCLUDE_COLUMNS.is_match(&name) {
                    continue;
                }
                record.insert(name, display_value(value));
            }
        }
    }
    record
}

/// Map a decoded cell to its display form: bytes are redacted, long strings
/// truncated with an ellipsis marker, everything else passes through.
fn display_value(value: CellValue) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Bool(b) => Value::Bool(b),
        CellValue::Int(i) => Value::Number(i.into()),
        CellValue::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        CellValue::Text(s) => Value::String(truncate(s)),
        CellValue::Bytes(_) => Value::String(BINARY_MARKER.to_string()),
        // Records stay flat and bounded: JSON scalars pass through, anything
        // structured is rendered to its (truncated) string form.
        CellValue::Json(v) => match v {
            Value::Null => Value::Null,
            Value::Bool(b) => Value::Bool(b),
            Value::Number(n) => Value::Number(n),
            Value::String(s) => Value::String(truncate(s)),
            other => Value::String(truncate(other.to_string())),
        },
    }
}

fn truncate(s: String) -> String {
    if s.chars().count() <= MAX_TEXT_LEN {
        return s;
    }
    let mut out: String = s.chars().take(MAX_TEXT_LEN).collect();
    out.push_str("...");
    out
}

fn render_row(values: &[CellValue]) -> String {
    let rendered: Vec<String> = values
        .iter()
        .map(|v| match v {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Bytes(_) => BINARY_MARKER.to_string(),
            CellValue::Json(v) => v.to_string(),
        })
        .collect();
    format!("({})", rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_empty_result_set() {
        let result = RawResultSet {
            columns: vec!["a".to_string()],
            rows: vec![],
        };
        assert!(normalize(result, None).is_empty());
    }

    #[test]
    fn test_denylisted_column_dropped() {
        let result = RawResultSet {
            columns: vec!["id".to_string(), "attachment_blob".to_string()],
            rows: vec![RawRow::Positional(vec![
                CellValue::Int(1),
                CellValue::Bytes(vec![0xde, 0xad]),
            ])],
        };
        let records = normalize(result, None);
        assert_eq!(records.len(), 1);
        assert!(records[0].contains_key("id"));
        assert!(!records[0].contains_key("attachment_blob"));
    }

    #[test]
    fn test_bytes_in_kept_column_redacted() {
        let result = RawResultSet {
            columns: vec!["signature".to_string()],
            rows: vec![RawRow::Positional(vec![CellValue::Bytes(vec![1, 2, 3])])],
        };
        let records = normalize(result, None);
        assert_eq!(records[0]["signature"], Value::String(BINARY_MARKER.into()));
    }

    #[test]
    fn test_long_string_truncated_to_200_chars() {
        let long = "x".repeat(250);
        let result = RawResultSet {
            columns: vec!["notes".to_string()],
            rows: vec![RawRow::Positional(vec![CellValue::Text(long)])],
        };
        let records = normalize(result, None);
        let value = records[0]["notes"].as_str().unwrap();
        assert_eq!(value.len(), 203);
        assert!(value.ends_with("..."));
        assert_eq!(value.chars().filter(|c| *c == 'x').count(), 200);
    }

    #[test]
    fn test_exactly_200_chars_not_truncated() {
        let exact = "y".repeat(200);
        let result = RawResultSet {
            columns: vec!["notes".to_string()],
            rows: vec![RawRow::Positional(vec![CellValue::Text(exact.clone())])],
        };
        let records = normalize(result, None);
        assert_eq!(records[0]["notes"], Value::String(exact));
    }

    #[test]
    fn test_keep_columns_overrides_denylist() {
        let result = RawResultSet {
            columns: vec!["id".to_string(), "file_name".to_string()],
            rows: vec![RawRow::Positional(vec![CellValue::Int(7), text("a.pdf")])],
        };
        let keep = vec!["file_name".to_string(), "missing".to_string()];
        let records = normalize(result, Some(&keep));
        assert_eq!(records[0].len(), 1);
        assert_eq!(records[0]["file_name"], Value::String("a.pdf".into()));
    }

    #[test]
    fn test_synthesized_column_labels() {
        let result = RawResultSet {
            columns: vec![],
            rows: vec![RawRow::Positional(vec![CellValue::Int(1), text("a")])],
        };
        let records = normalize(result, None);
        assert!(records[0].contains_key("column_1"));
        assert!(records[0].contains_key("column_2"));
    }

    #[test]
    fn test_shape_mismatch_degrades_to_single_field() {
        let result = RawResultSet {
            columns: vec!["a".to_string(), "b".to_string()],
            rows: vec![RawRow::Positional(vec![CellValue::Int(1)])],
        };
        let records = normalize(result, None);
        assert_eq!(records[0].len(), 1);
        assert!(records[0]["result"].as_str().unwrap().contains('1'));
    }

    #[test]
    fn test_mapped_rows_used_directly() {
        let result = RawResultSet {
            columns: vec![],
            rows: vec![RawRow::Mapped(vec![
                ("month".to_string(), text("2024-01")),
                ("total".to_string(), CellValue::Float(10.5)),
            ])],
        };
        let records = normalize(result, None);
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, ["month", "total"]);
    }

    #[test]
    fn test_json_string_cell_truncated() {
        let result = RawResultSet {
            columns: vec!["payload".to_string()],
            rows: vec![RawRow::Positional(vec![CellValue::Json(Value::String(
                "j".repeat(500),
            ))])],
        };
        let records = normalize(result, None);
        let value = records[0]["payload"].as_str().unwrap();
        assert_eq!(value.chars().filter(|c| *c == 'j').count(), 200);
        assert!(value.ends_with("..."));
    }

    #[test]
    fn test_json_object_cell_flattened_to_bounded_string() {
        let nested = serde_json::json!({
            "vendor": "Acme",
            "lines": [{"sku": "A1", "note": "n".repeat(300)}],
        });
        let result = RawResultSet {
            columns: vec!["payload".to_string()],
            rows: vec![RawRow::Positional(vec![CellValue::Json(nested)])],
        };
        let records = normalize(result, None);
        // Structured JSON must not survive as a nested value.
        let value = records[0]["payload"].as_str().unwrap();
        assert!(value.starts_with('{'));
        assert!(value.chars().count() <= MAX_TEXT_LEN + 3);
    }

    #[test]
    fn test_json_scalar_cells_pass_through() {
        let result = RawResultSet {
            columns: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            rows: vec![RawRow::Positional(vec![
                CellValue::Json(Value::Bool(true)),
                CellValue::Json(serde_json::json!(42)),
                CellValue::Json(Value::Null),
            ])],
        };
        let records = normalize(result, None);
        assert_eq!(records[0]["a"], Value::Bool(true));
        assert_eq!(records[0]["b"], serde_json::json!(42));
        assert_eq!(records[0]["c"], Value::Null);
    }

    #[test]
    fn test_null_and_scalars_pass_through() {
        let result = RawResultSet {
            columns: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            rows: vec![RawRow::Positional(vec![
                CellValue::Null,
                CellValue::Bool(true),
                CellValue::Int(-3),
            ])],
        };
        let records = normalize(result, None);
        assert_eq!(records[0]["a"], Value::Null);
        assert_eq!(records[0]["b"], Value::Bool(true));
        assert_eq!(records[0]["c"], Value::Number((-3).into()));
    }
}
