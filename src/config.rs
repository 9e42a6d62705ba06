//! Environment-driven configuration.

use crate::error::{QueryError, Result};

const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from the environment. Callers are expected to have
    /// run `dotenv::dotenv().ok()` first.
    pub fn from_env() -> Result<Self> {
        let database_url = require("DATABASE_URL")?;
        let llm_api_key = require("LLM_API_KEY")?;

        let llm_base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_string());
        let llm_model =
            std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string());

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| QueryError::Config(format!("PORT is not a valid port: {}", raw)))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            database_url,
            llm_api_key,
            llm_base_url,
            llm_model,
            port,
        })
    }
}

fn require(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(QueryError::Config(format!(
            "{} environment variable is required",
            name
        ))),
    }
}
