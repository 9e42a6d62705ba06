//! The query pipeline: question -> prompt -> SQL -> execution -> response.

use crate::classify::classify;
use crate::config::Config;
use crate::db::connection::init_pool;
use crate::db::postgres::PgDatabase;
use crate::db::SqlDatabase;
use crate::error::{QueryError, Result};
use crate::llm::{LanguageModel, LlmClient};
use crate::prompt::SchemaDescription;
use crate::response::{compose, QueryResponse};
use crate::result::normalize;
use crate::sqlgen::SqlGenerator;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct QueryService<M: LanguageModel, D: SqlDatabase> {
    generator: SqlGenerator<M>,
    db: D,
    schema: SchemaDescription,
}

impl<M: LanguageModel, D: SqlDatabase> QueryService<M, D> {
    /// Build the service, introspecting the schema once. Introspection
    /// failure degrades the prompt context instead of failing startup.
    pub async fn new(model: M, db: D) -> Self {
        let schema = match db.introspect().await {
            Ok(schema) => {
                info!(tables = schema.table_count(), "schema introspected");
                schema
            }
            Err(e) => {
                warn!(error = %e, "schema introspection failed, continuing with empty schema");
                SchemaDescription::new()
            }
        };
        Self {
            generator: SqlGenerator::new(model),
            db,
            schema,
        }
    }

    /// Handle one natural-language question end to end.
    ///
    /// Only two failure shapes escape: an LLM failure (passed through) and an
    /// execution failure rewritten by the classifier. Raw driver error text
    /// is logged here and never surfaced to the caller.
    pub async fn handle_query(&self, question: &str) -> Result<QueryResponse> {
        let request_id = Uuid::new_v4();
        info!(%request_id, question = %question, "handling query");

        let sql = self.generator.generate(&self.schema, question).await?;

        match self.db.execute(&sql).await {
            Ok(raw) => {
                let records = normalize(raw, None);
                info!(%request_id, rows = records.len(), "query executed");
                Ok(compose(sql, records))
            }
            Err(QueryError::Execution(raw_message)) => {
                error!(%request_id, sql = %sql, error = %raw_message, "execution failed");
                let message = classify(&raw_message, &sql);
                Err(QueryError::QueryFailed { sql, message })
            }
            Err(other) => Err(other),
        }
    }

    pub fn schema(&self) -> &SchemaDescription {
        &self.schema
    }
}

/// The concrete service the server binary runs.
pub type AppService = QueryService<LlmClient, PgDatabase>;

static SERVICE: OnceCell<AppService> = OnceCell::const_new();

/// Process-wide service instance. Lazily initialized; concurrent first
/// requests construct it at most once, later reads are lock-free.
pub async fn service(config: &Config) -> Result<&'static AppService> {
    SERVICE
        .get_or_try_init(|| async {
            let pool = init_pool(&config.database_url)
                .await
                .map_err(|e| QueryError::Config(format!("database connection failed: {}", e)))?;
            let model = LlmClient::new(
                config.llm_api_key.clone(),
                config.llm_model.clone(),
                config.llm_base_url.clone(),
            );
            Ok(QueryService::new(model, PgDatabase::new(pool)).await)
        })
        .await
}
