//! LLM client for SQL generation.
//!
//! Talks to any OpenAI-compatible chat-completions endpoint. The client is
//! deliberately dumb: one request, no retries, no response parsing beyond
//! extracting the completion text. Correctness of what the model produced is
//! discovered at execution time.

use crate::error::{QueryError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Bounded call timeout; a hung provider must not hang the request forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The one capability the pipeline needs from a text model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_key,
            base_url,
            model,
        }
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": 0.1,
            "max_tokens": 500,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| QueryError::Llm(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(QueryError::Llm(format!(
                "LLM API error ({}): {}",
                status, error_text
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| QueryError::Llm(format!("Failed to parse LLM response: {}", e)))?;

        if let Some(error) = response_json.get("error") {
            return Err(QueryError::Llm(format!(
                "LLM API error: {}",
                serde_json::to_string(error).unwrap_or_else(|_| "Unknown error".to_string())
            )));
        }

        let choices = response_json
            .get("choices")
            .and_then(|c| c.as_array())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| QueryError::Llm("No choices in LLM response".to_string()))?;

        if let Some(finish_reason) = choices[0].get("finish_reason").and_then(|r| r.as_str()) {
            if finish_reason == "length" {
                warn!("LLM response was truncated due to length limit");
            } else if finish_reason == "content_filter" {
                return Err(QueryError::Llm(
                    "LLM response was filtered by content policy".to_string(),
                ));
            }
        }

        let content = choices[0]["message"]["content"]
            .as_str()
            .ok_or_else(|| QueryError::Llm("No content in LLM response".to_string()))?;

        if content.is_empty() {
            return Err(QueryError::Llm("Empty content in LLM response".to_string()));
        }

        Ok(content.to_string())
    }
}
