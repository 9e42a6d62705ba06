//! Database error classification.
//!
//! Maps raw driver error text onto a fixed taxonomy of failure categories and
//! renders a friendly, actionable explanation. Matching is case-insensitive
//! substring/regex probing in a fixed priority order; error texts often
//! contain several trigger words at once and the earlier categories are the
//! more specific ones, so the first match wins. This function must never
//! fail: a missed extraction falls through to the next category and the
//! final branch is a guaranteed generic fallback.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

/// Example tables offered as a hint when a missing table can't be named.
const EXAMPLE_TABLES: &str = "invoices, vendors, users";

/// Display cap for the raw first line quoted in the fallback message.
const MAX_DETAIL_LEN: usize = 200;

lazy_static! {
    // column "total_spend" does not exist  (optionally schema-qualified)
    static ref MISSING_COLUMN: Regex = Regex::new(
        r#"(?i)column\s+["'`]?([A-Za-z_][\w$]*(?:\.[A-Za-z_][\w$]*)*)["'`]?\s+does(?:n't| not) exist"#
    )
    .expect("invalid missing-column pattern");
    // Unknown column 'foo' in 'field list'  (MySQL flavor)
    static ref UNKNOWN_COLUMN: Regex =
        Regex::new(r#"(?i)unknown column\s+["'`]?([A-Za-z_][\w$]*(?:\.[A-Za-z_][\w$]*)*)"#)
            .expect("invalid unknown-column pattern");
    // relation "invoices" does not exist / table 'x' doesn't exist
    static ref MISSING_TABLE: Regex = Regex::new(
        r#"(?i)(?:table|relation)\s+["'`]?([A-Za-z_][\w$]*(?:\.[A-Za-z_][\w$]*)*)["'`]?\s+does(?:n't| not) exist"#
    )
    .expect("invalid missing-table pattern");
    static ref NO_SUCH_TABLE: Regex =
        Regex::new(r#"(?i)no such table:?\s+["'`]?([A-Za-z_][\w$]*(?:\.[A-Za-z_][\w$]*)*)"#)
            .expect("invalid no-such-table pattern");
    static ref AGGREGATE_FN: Regex =
        Regex::new(r"(?i)\b(sum|avg|count|min|max)\b").expect("invalid aggregate pattern");
}

/// Known failure categories, in match priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    ColumnNotFound(Option<String>),
    TableNotFound(Option<String>),
    SyntaxError,
    AmbiguousReference,
    PermissionDenied,
    DivisionByZero,
    TypeMismatch,
    AggregationError,
    ConnectivityError,
    ConstraintViolation,
    Unknown,
}

impl ErrorCategory {
    /// Probe the raw error text against each category in priority order.
    pub fn detect(raw: &str) -> ErrorCategory {
        let lower = raw.to_lowercase();

        let missing = |text: &str| {
            text.contains("does not exist")
                || text.contains("doesn't exist")
                || text.contains("not found")
        };

        if lower.contains("column") && (missing(&lower) || lower.contains("unknown column")) {
            let name = MISSING_COLUMN
                .captures(raw)
                .or_else(|| UNKNOWN_COLUMN.captures(raw))
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
            return ErrorCategory::ColumnNotFound(name);
        }

        if (lower.contains("table") || lower.contains("relation"))
            && (missing(&lower) || lower.contains("no such table") || lower.contains("unknown table"))
        {
            let name = MISSING_TABLE
                .captures(raw)
                .or_else(|| NO_SUCH_TABLE.captures(raw))
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
            return ErrorCategory::TableNotFound(name);
        }

        if lower.contains("syntax") {
            return ErrorCategory::SyntaxError;
        }

        if lower.contains("ambiguous") {
            return ErrorCategory::AmbiguousReference;
        }

        if lower.contains("permission denied")
            || lower.contains("access denied")
            || lower.contains("not authorized")
            || lower.contains("privilege")
        {
            return ErrorCategory::PermissionDenied;
        }

        if lower.contains("division by zero") || lower.contains("divide by zero") {
            return ErrorCategory::DivisionByZero;
        }

        if lower.contains("type")
            && (lower.contains("mismatch") || lower.contains("cannot") || lower.contains("invalid"))
        {
            return ErrorCategory::TypeMismatch;
        }

        // Requires both an aggregate function and a grouping keyword so that
        // unrelated errors mentioning "count" don't land here.
        if AGGREGATE_FN.is_match(&lower)
            && (lower.contains("group") || lower.contains("aggregate") || lower.contains("having"))
        {
            return ErrorCategory::AggregationError;
        }

        if lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("connection")
            || lower.contains("could not connect")
            || lower.contains("network")
        {
            return ErrorCategory::ConnectivityError;
        }

        if lower.contains("constraint")
            || lower.contains("foreign key")
            || lower.contains("duplicate key")
            || lower.contains("violates")
        {
            return ErrorCategory::ConstraintViolation;
        }

        ErrorCategory::Unknown
    }
}

/// Translate a raw database error into a friendly, actionable message. Pure
/// function; the raw text is never surfaced except as the quoted first line
/// of the generic fallback.
pub fn classify(raw_message: &str, sql: &str) -> String {
    let category = ErrorCategory::detect(raw_message);
    debug!(?category, sql = %sql, "classified execution error");

    match category {
        ErrorCategory::ColumnNotFound(Some(name)) => format!(
            "I couldn't find a column named '{}' in the database. \
             Try rephrasing your question with different field names, \
             or ask what information is available.",
            name
        ),
        ErrorCategory::ColumnNotFound(None) => "The query referenced a column that doesn't \
             exist in the database. Try rephrasing your question with different field names, \
             or ask what information is available."
            .to_string(),
        ErrorCategory::TableNotFound(Some(name)) => format!(
            "I couldn't find a table named '{}' in the database. \
             Try asking about the data in different terms, or ask what tables are available.",
            name
        ),
        ErrorCategory::TableNotFound(None) => format!(
            "The query referenced a table that doesn't exist in the database. \
             Try asking about one of the known tables, for example: {}.",
            EXAMPLE_TABLES
        ),
        ErrorCategory::SyntaxError => "The generated SQL had a syntax problem. This sometimes \
             happens with complicated questions — try asking in a simpler or more specific way."
            .to_string(),
        ErrorCategory::AmbiguousReference => "The question matched a column that appears in \
             more than one table, so the database couldn't tell which one was meant. \
             Try mentioning the table you're interested in."
            .to_string(),
        ErrorCategory::PermissionDenied => "The database account doesn't have permission to \
             read that data. If you think you should have access, contact your administrator."
            .to_string(),
        ErrorCategory::DivisionByZero => "The calculation ran into a division by zero, \
             usually because a group or denominator had no data. \
             Try narrowing the question to rows where the value is present."
            .to_string(),
        ErrorCategory::TypeMismatch => "The query tried to combine values of incompatible \
             types (for example comparing text with numbers). \
             Try being more explicit about the values you want to compare."
            .to_string(),
        ErrorCategory::AggregationError => "The query mixed aggregated values with \
             non-aggregated columns. Try asking for either totals or individual rows, \
             or name the field you want the results grouped by."
            .to_string(),
        ErrorCategory::ConnectivityError => "I couldn't reach the database (connection \
             problem or timeout). Please try again in a moment; if it keeps happening, \
             contact your administrator."
            .to_string(),
        ErrorCategory::ConstraintViolation => "The query violated a database constraint \
             (such as a foreign-key or uniqueness rule). This usually means the question \
             implies a data change the database won't allow."
            .to_string(),
        ErrorCategory::Unknown => format!(
            "I ran into a problem executing the query: {}. \
             Try rephrasing your question, or be more specific about the tables \
             and time range you're interested in.",
            first_detail_line(raw_message)
        ),
    }
}

/// First non-empty, non-parenthesized line of the raw message, capped for
/// display.
fn first_detail_line(raw: &str) -> String {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('('))
        .unwrap_or("unknown error");
    let mut detail: String = line.chars().take(MAX_DETAIL_LEN).collect();
    if line.chars().count() > MAX_DETAIL_LEN {
        detail.push_str("...");
    }
    detail
}
