//! Response composition: chart-type hint and summary message.

use crate::result::NormalizedRecord;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chart hints are only worth showing for small result sets.
const CHART_MAX_ROWS: usize = 20;
const BAR_MAX_ROWS: usize = 10;

const SUMMARY_MAX_COLUMNS: usize = 8;
const SAMPLE_MAX_FIELDS: usize = 5;

pub const NO_ROWS_MESSAGE: &str = "I ran the generated SQL but didn't find any matching rows. \
     You can try rephrasing your question or broadening the filters.";

/// The success payload returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub sql: String,
    pub data: Vec<NormalizedRecord>,
    #[serde(rename = "chartType")]
    pub chart_type: Option<String>,
    pub message: String,
}

pub fn compose(sql: String, records: Vec<NormalizedRecord>) -> QueryResponse {
    let chart_type = chart_type_hint(&records).map(str::to_string);
    let message = summary_message(&records);
    QueryResponse {
        sql,
        data: records,
        chart_type,
        message,
    }
}

/// Pick a chart type from the shape of the results: date-like column names
/// suggest a time series, otherwise a handful of rows suggests a bar chart.
fn chart_type_hint(records: &[NormalizedRecord]) -> Option<&'static str> {
    if records.is_empty() || records.len() > CHART_MAX_ROWS {
        return None;
    }
    let date_like = records[0].keys().any(|key| {
        let key = key.to_lowercase();
        key.contains("date") || key.contains("time") || key.contains("month")
    });
    if date_like {
        Some("line")
    } else if records.len() <= BAR_MAX_ROWS {
        Some("bar")
    } else {
        None
    }
}

/// Short chat-style summary: row count, leading column names, and a sample of
/// the first record.
fn summary_message(records: &[NormalizedRecord]) -> String {
    if records.is_empty() {
        return NO_ROWS_MESSAGE.to_string();
    }

    let first = &records[0];
    let mut columns = first.keys().take(SUMMARY_MAX_COLUMNS).join(", ");
    if first.len() > SUMMARY_MAX_COLUMNS {
        columns.push_str(", ...");
    }

    let sample = first
        .iter()
        .take(SAMPLE_MAX_FIELDS)
        .map(|(key, value)| format!("{}: {}", key, render_value(value)))
        .join(", ");

    format!(
        "I ran the SQL and found {} row{}. Columns returned: {}. Here's a sample row: {{{}}}",
        records.len(),
        if records.len() == 1 { "" } else { "s" },
        columns,
        sample
    )
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
