//! PostgreSQL querier backed by a sqlx pool

use crate::context::ExecContext;
use crate::database::config::{redact_url, DatabaseConnectionConfig};
use crate::database::querier::{Querier, QueryResult, Row};
use crate::database::value::SqlValue;
use crate::error::{Error, Result};
use crate::models::field::FieldType;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row as _, TypeInfo, ValueRef};
use std::time::Duration;

const DIALECT: &str = "postgres";

/// PostgreSQL querier
#[derive(Clone, Debug)]
pub struct PostgresQuerier {
    name: String,
    pool: PgPool,
}

impl PostgresQuerier {
    /// Open a pool for `config`
    pub async fn connect(name: impl Into<String>, config: &DatabaseConnectionConfig) -> Result<Self> {
        let name = name.into();
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .connect(&config.url)
            .await
            .map_err(|e| {
                Error::database_connection(format!(
                    "Failed to connect to PostgreSQL '{}' at {}: {}",
                    name,
                    redact_url(&config.url),
                    e
                ))
            })?;

        log::info!("Connected PostgreSQL database '{}'", name);
        Ok(Self { name, pool })
    }

    /// Create querier from existing pool
    pub fn from_pool(name: impl Into<String>, pool: PgPool) -> Self {
        Self {
            name: name.into(),
            pool,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn prepare<'q>(sql: &'q str, params: Vec<SqlValue>) -> Query<'q, Postgres, PgArguments> {
        params.into_iter().fold(sqlx::query(sql), bind_param)
    }
}

fn bind_param(
    query: Query<'_, Postgres, PgArguments>,
    value: SqlValue,
) -> Query<'_, Postgres, PgArguments> {
    match value {
        // Declared as bytea, which only fits bytea columns and IS NULL tests
        SqlValue::Null => query.bind(None::<Vec<u8>>),
        SqlValue::TypedNull(kind) => bind_null(query, kind),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::UInt(u) => match i64::try_from(u) {
            Ok(i) => query.bind(i),
            Err(_) => query.bind(Decimal::from(u)),
        },
        SqlValue::Double(f) => query.bind(f),
        SqlValue::Decimal(d) => query.bind(d),
        SqlValue::String(s) => query.bind(s),
        SqlValue::Bytes(b) => query.bind(b),
        SqlValue::Json(j) => query.bind(j),
        SqlValue::Date(d) => query.bind(d),
        SqlValue::DateTime(dt) => query.bind(dt),
        SqlValue::Timestamp(ts) => query.bind(ts),
    }
}

/// NULL declared with a type Postgres will assign to a `kind` column
fn bind_null(
    query: Query<'_, Postgres, PgArguments>,
    kind: FieldType,
) -> Query<'_, Postgres, PgArguments> {
    match kind {
        FieldType::Boolean => query.bind(None::<bool>),
        FieldType::VarChar | FieldType::Char | FieldType::Text => query.bind(None::<String>),
        FieldType::Time => query.bind(None::<NaiveTime>),
        FieldType::Date => query.bind(None::<NaiveDate>),
        FieldType::DateTime => query.bind(None::<DateTime<Utc>>),
        FieldType::Float => query.bind(None::<f64>),
        FieldType::Decimal => query.bind(None::<Decimal>),
        FieldType::Json | FieldType::Jsonb => query.bind(None::<JsonValue>),
        _ => query.bind(None::<i64>),
    }
}

fn decode_value(row: &PgRow, index: usize) -> Result<SqlValue> {
    let column = &row.columns()[index];
    let raw = row
        .try_get_raw(index)
        .map_err(|e| Error::decode(column.name(), e.to_string()))?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }

    let type_name = column.type_info().name().to_string();
    let decoded = match type_name.as_str() {
        "BOOL" => row.try_get::<bool, _>(index).map(SqlValue::Bool),
        "INT2" => row.try_get::<i16, _>(index).map(|v| SqlValue::Int(i64::from(v))),
        "INT4" => row.try_get::<i32, _>(index).map(|v| SqlValue::Int(i64::from(v))),
        "INT8" => row.try_get::<i64, _>(index).map(SqlValue::Int),
        "OID" => row
            .try_get::<sqlx::postgres::types::Oid, _>(index)
            .map(|v| SqlValue::UInt(u64::from(v.0))),
        "FLOAT4" => row.try_get::<f32, _>(index).map(|v| SqlValue::Double(f64::from(v))),
        "FLOAT8" => row.try_get::<f64, _>(index).map(SqlValue::Double),
        "NUMERIC" => row.try_get::<Decimal, _>(index).map(SqlValue::Decimal),
        "DATE" => row.try_get::<NaiveDate, _>(index).map(SqlValue::Date),
        "TIME" => row
            .try_get::<NaiveTime, _>(index)
            .map(|t| SqlValue::String(t.to_string())),
        "TIMESTAMP" => row.try_get::<NaiveDateTime, _>(index).map(SqlValue::DateTime),
        "TIMESTAMPTZ" => row.try_get::<DateTime<Utc>, _>(index).map(SqlValue::Timestamp),
        "BYTEA" => row.try_get::<Vec<u8>, _>(index).map(SqlValue::Bytes),
        "JSON" | "JSONB" => row.try_get::<JsonValue, _>(index).map(SqlValue::Json),
        _ => row.try_get::<String, _>(index).map(SqlValue::String),
    };

    decoded.map_err(|e| {
        log::warn!(
            "Cannot decode column '{}' of type {}: {}",
            column.name(),
            type_name,
            e
        );
        Error::decode(column.name(), format!("unsupported type {}", type_name))
    })
}

fn decode_row(row: &PgRow) -> Result<Row> {
    let columns = row.columns().iter().map(|c| c.name().to_string()).collect();
    let values = (0..row.len())
        .map(|i| decode_value(row, i))
        .collect::<Result<Vec<_>>>()?;
    Ok(Row::new(columns, values))
}

#[async_trait]
impl Querier for PostgresQuerier {
    async fn exec(&self, ctx: &ExecContext, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult> {
        log::debug!("PostgreSQL EXECUTE on '{}': {}", self.name, sql);
        let query = Self::prepare(sql, params);
        let result = ctx
            .run(async {
                query
                    .execute(&self.pool)
                    .await
                    .map_err(|e| Error::driver(DIALECT, sql, e))
            })
            .await?;

        // Generated keys come back through RETURNING instead
        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: None,
        })
    }

    async fn query_row(
        &self,
        ctx: &ExecContext,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> Result<Option<Row>> {
        log::debug!("PostgreSQL QUERY ROW on '{}': {}", self.name, sql);
        let query = Self::prepare(sql, params);
        let row = ctx
            .run(async {
                query
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| Error::driver(DIALECT, sql, e))
            })
            .await?;

        row.as_ref().map(decode_row).transpose()
    }

    async fn query_rows(
        &self,
        ctx: &ExecContext,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> Result<Vec<Row>> {
        log::debug!("PostgreSQL QUERY on '{}': {}", self.name, sql);
        let query = Self::prepare(sql, params);
        let rows = ctx
            .run(async {
                query
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| Error::driver(DIALECT, sql, e))
            })
            .await?;

        rows.iter().map(decode_row).collect()
    }
}
