//! Prompt construction for SQL generation.

use itertools::Itertools;
use std::collections::BTreeMap;

pub const SYSTEM_PROMPT: &str =
    "You are a SQL expert. Generate valid PostgreSQL queries based on natural language questions.";

/// Cached map of table name -> ordered column names, used to ground the
/// prompt. Built once per service instance; empty when introspection failed.
#[derive(Debug, Clone, Default)]
pub struct SchemaDescription {
    tables: BTreeMap<String, Vec<String>>,
}

impl SchemaDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: impl Into<String>, columns: Vec<String>) {
        self.tables.insert(table.into(), columns);
    }

    pub fn add_column(&mut self, table: &str, column: impl Into<String>) {
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(column.into());
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Render each table as `name(col1, col2, ...)`, one per line.
    pub fn render(&self) -> String {
        self.tables
            .iter()
            .map(|(table, columns)| format!("- {}({})", table, columns.iter().join(", ")))
            .join("\n")
    }
}

/// Deterministic prompt: schema context, the fixed instruction block, and the
/// verbatim question. The question is untrusted text but only ever flows into
/// the prompt, never into SQL directly.
pub fn build_prompt(schema: &SchemaDescription, question: &str) -> String {
    format!(
        "Given the following database schema and a natural language question, \
         generate a valid PostgreSQL query.\n\n\
         Database Schema:\n{}\n\n\
         Question: {}\n\n\
         Generate only the SQL query, no explanations. Return valid PostgreSQL syntax.\n\n\
         SQL Query:",
        schema.render(),
        question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> SchemaDescription {
        let mut schema = SchemaDescription::new();
        schema.add_table(
            "invoices",
            vec!["id".to_string(), "amount".to_string(), "vendor_id".to_string()],
        );
        schema.add_table("vendors", vec!["id".to_string(), "name".to_string()]);
        schema
    }

    #[test]
    fn test_render_one_table_per_line() {
        let rendered = sample_schema().render();
        assert_eq!(
            rendered,
            "- invoices(id, amount, vendor_id)\n- vendors(id, name)"
        );
    }

    #[test]
    fn test_prompt_contains_schema_and_verbatim_question() {
        let prompt = build_prompt(&sample_schema(), "what's the total spend?");
        assert!(prompt.contains("invoices(id, amount, vendor_id)"));
        assert!(prompt.contains("Question: what's the total spend?"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let schema = sample_schema();
        assert_eq!(
            build_prompt(&schema, "top vendors"),
            build_prompt(&schema, "top vendors")
        );
    }
}
