use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Schema introspection error: {0}")]
    Introspection(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Execution error: {0}")]
    Execution(String),

    /// Execution failure after classification. `message` is the friendly
    /// explanation; the raw driver text never leaves the service.
    #[error("{message}")]
    QueryFailed { sql: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QueryError>;
