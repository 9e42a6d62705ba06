//! Database access layer.

pub mod connection;
pub mod postgres;

use crate::error::Result;
use crate::prompt::SchemaDescription;
use crate::result::RawResultSet;
use async_trait::async_trait;

/// The two capabilities the pipeline needs from a database backend.
///
/// `execute` failures carry the raw driver message for the error classifier;
/// `introspect` failures are recoverable (the prompt degrades to an empty
/// schema context).
#[async_trait]
pub trait SqlDatabase: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<RawResultSet>;
    async fn introspect(&self) -> Result<SchemaDescription>;
}
