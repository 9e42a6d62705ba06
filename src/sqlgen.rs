//! SQL generation from natural language.
//!
//! Thin wrapper over the language model: build the prompt, get a completion,
//! strip markdown artifacts. No parsing, no retries, no semantic validation;
//! a malformed statement is discovered at execution time and handled by the
//! error classifier.

use crate::error::Result;
use crate::llm::LanguageModel;
use crate::prompt::{build_prompt, SchemaDescription, SYSTEM_PROMPT};
use tracing::info;

pub struct SqlGenerator<M: LanguageModel> {
    model: M,
}

impl<M: LanguageModel> SqlGenerator<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub async fn generate(&self, schema: &SchemaDescription, question: &str) -> Result<String> {
        let prompt = build_prompt(schema, question);
        let response = self.model.complete(SYSTEM_PROMPT, &prompt).await?;
        let sql = strip_code_fence(&response);
        info!(sql = %sql, "generated SQL");
        Ok(sql)
    }
}

/// Strip a triple-backtick fence and an optional leading language tag from an
/// LLM response. Unfenced input is just trimmed.
pub fn strip_code_fence(response: &str) -> String {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    // Content between the first and second fence, minus the language tag.
    let mut inner = trimmed.split("```").nth(1).unwrap_or(trimmed).trim();
    for tag in ["sql", "SQL"] {
        if let Some(rest) = inner.strip_prefix(tag) {
            inner = rest;
            break;
        }
    }
    inner.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfenced_passthrough() {
        assert_eq!(strip_code_fence("  SELECT 1  "), "SELECT 1");
    }

    #[test]
    fn test_fenced_with_language_tag() {
        let input = "```sql\nSELECT * FROM invoices\n```";
        assert_eq!(strip_code_fence(input), "SELECT * FROM invoices");
    }

    #[test]
    fn test_fenced_without_language_tag() {
        let input = "```\nSELECT count(*) FROM vendors\n```";
        assert_eq!(strip_code_fence(input), "SELECT count(*) FROM vendors");
    }

    #[test]
    fn test_uppercase_tag() {
        let input = "```SQL\nSELECT 1\n```";
        assert_eq!(strip_code_fence(input), "SELECT 1");
    }

    #[test]
    fn test_missing_closing_fence() {
        let input = "```sql\nSELECT month, total FROM sales";
        assert_eq!(strip_code_fence(input), "SELECT month, total FROM sales");
    }
}
