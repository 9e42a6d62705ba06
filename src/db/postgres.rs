//! PostgreSQL backend.
//!
//! Executes arbitrary generated SQL and decodes whatever comes back into
//! owned [`CellValue`]s by runtime type-name dispatch. Decoding is best
//! effort: a cell whose type we can't read degrades to null rather than
//! failing the row.

use crate::db::SqlDatabase;
use crate::error::{QueryError, Result};
use crate::prompt::SchemaDescription;
use crate::result::{CellValue, RawResultSet, RawRow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Column, Row, TypeInfo};
use tracing::debug;

const INTROSPECT_SQL: &str = "SELECT table_name::text, column_name::text \
     FROM information_schema.columns \
     WHERE table_schema = 'public' \
     ORDER BY table_name, ordinal_position";

#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SqlDatabase for PgDatabase {
    async fn execute(&self, sql: &str) -> Result<RawResultSet> {
        let rows: Vec<PgRow> = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| QueryError::Execution(e.to_string()))?;

        let Some(first) = rows.first() else {
            return Ok(RawResultSet::default());
        };

        let columns: Vec<String> = first.columns().iter().map(|c| c.name().to_string()).collect();

        let raw_rows = rows
            .iter()
            .map(|row| {
                let values = (0..row.columns().len())
                    .map(|idx| decode_cell(row, idx))
                    .collect();
                RawRow::Positional(values)
            })
            .collect();

        Ok(RawResultSet {
            columns,
            rows: raw_rows,
        })
    }

    async fn introspect(&self) -> Result<SchemaDescription> {
        let rows: Vec<PgRow> = sqlx::query(INTROSPECT_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| QueryError::Introspection(e.to_string()))?;

        let mut schema = SchemaDescription::new();
        for row in &rows {
            let table: String = row.try_get(0).unwrap_or_default();
            let column: String = row.try_get(1).unwrap_or_default();
            if !table.is_empty() && !column.is_empty() {
                schema.add_column(&table, column);
            }
        }
        Ok(schema)
    }
}

fn decode_cell(row: &PgRow, idx: usize) -> CellValue {
    let column = &row.columns()[idx];
    let type_name = column.type_info().name();

    match type_name {
        "BOOL" => decoded(row.try_get::<Option<bool>, _>(idx), CellValue::Bool, column.name()),
        "INT2" => decoded(
            row.try_get::<Option<i16>, _>(idx),
            |v| CellValue::Int(v as i64),
            column.name(),
        ),
        "INT4" => decoded(
            row.try_get::<Option<i32>, _>(idx),
            |v| CellValue::Int(v as i64),
            column.name(),
        ),
        "INT8" => decoded(row.try_get::<Option<i64>, _>(idx), CellValue::Int, column.name()),
        "FLOAT4" => decoded(
            row.try_get::<Option<f32>, _>(idx),
            |v| CellValue::Float(v as f64),
            column.name(),
        ),
        "FLOAT8" => decoded(row.try_get::<Option<f64>, _>(idx), CellValue::Float, column.name()),
        "NUMERIC" => decoded(
            row.try_get::<Option<Decimal>, _>(idx),
            |d| match d.to_f64() {
                Some(f) => CellValue::Float(f),
                None => CellValue::Text(d.to_string()),
            },
            column.name(),
        ),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" | "CITEXT" => {
            decoded(row.try_get::<Option<String>, _>(idx), CellValue::Text, column.name())
        }
        "BYTEA" => decoded(row.try_get::<Option<Vec<u8>>, _>(idx), CellValue::Bytes, column.name()),
        "DATE" => decoded(
            row.try_get::<Option<NaiveDate>, _>(idx),
            |d| CellValue::Text(d.to_string()),
            column.name(),
        ),
        "TIME" => decoded(
            row.try_get::<Option<NaiveTime>, _>(idx),
            |t| CellValue::Text(t.to_string()),
            column.name(),
        ),
        "TIMESTAMP" => decoded(
            row.try_get::<Option<NaiveDateTime>, _>(idx),
            |t| CellValue::Text(t.format("%Y-%m-%d %H:%M:%S").to_string()),
            column.name(),
        ),
        "TIMESTAMPTZ" => decoded(
            row.try_get::<Option<DateTime<Utc>>, _>(idx),
            |t| CellValue::Text(t.to_rfc3339()),
            column.name(),
        ),
        "JSON" | "JSONB" => decoded(
            row.try_get::<Option<serde_json::Value>, _>(idx),
            CellValue::Json,
            column.name(),
        ),
        "UUID" => decoded(
            row.try_get::<Option<uuid::Uuid>, _>(idx),
            |u| CellValue::Text(u.to_string()),
            column.name(),
        ),
        _ => {
            // Last resort: many exotic types decode as text.
            match row.try_get::<Option<String>, _>(idx) {
                Ok(Some(s)) => CellValue::Text(s),
                Ok(None) => CellValue::Null,
                Err(e) => {
                    debug!(
                        column = column.name(),
                        pg_type = type_name,
                        error = %e,
                        "undecodable cell, rendering as null"
                    );
                    CellValue::Null
                }
            }
        }
    }
}

fn decoded<T>(
    value: sqlx::Result<Option<T>>,
    wrap: impl FnOnce(T) -> CellValue,
    column: &str,
) -> CellValue {
    match value {
        Ok(Some(v)) => wrap(v),
        Ok(None) => CellValue::Null,
        Err(e) => {
            debug!(column = column, error = %e, "failed to decode cell, rendering as null");
            CellValue::Null
        }
    }
}
