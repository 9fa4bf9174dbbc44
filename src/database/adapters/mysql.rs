//! MySQL querier backed by a sqlx pool

use crate::context::ExecContext;
use crate::database::config::{redact_url, DatabaseConnectionConfig};
use crate::database::querier::{Querier, QueryResult, Row};
use crate::database::value::SqlValue;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlArguments, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, MySqlPool, Row as _, TypeInfo, ValueRef};
use std::time::Duration;

const DIALECT: &str = "mysql";

/// MySQL querier
#[derive(Clone, Debug)]
pub struct MySqlQuerier {
    name: String,
    pool: MySqlPool,
}

impl MySqlQuerier {
    /// Open a pool for `config`
    pub async fn connect(name: impl Into<String>, config: &DatabaseConnectionConfig) -> Result<Self> {
        let name = name.into();
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .connect(&config.url)
            .await
            .map_err(|e| {
                Error::database_connection(format!(
                    "Failed to connect to MySQL '{}' at {}: {}",
                    name,
                    redact_url(&config.url),
                    e
                ))
            })?;

        log::info!("Connected MySQL database '{}'", name);
        Ok(Self { name, pool })
    }

    /// Create querier from existing pool
    pub fn from_pool(name: impl Into<String>, pool: MySqlPool) -> Self {
        Self {
            name: name.into(),
            pool,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    fn prepare<'q>(sql: &'q str, params: Vec<SqlValue>) -> Query<'q, MySql, MySqlArguments> {
        params.into_iter().fold(sqlx::query(sql), bind_param)
    }
}

fn bind_param(
    query: Query<'_, MySql, MySqlArguments>,
    value: SqlValue,
) -> Query<'_, MySql, MySqlArguments> {
    match value {
        SqlValue::Null | SqlValue::TypedNull(_) => query.bind(None::<Vec<u8>>), // MySQL accepts NULL for any type
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::UInt(u) => query.bind(u),
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

fn decode_value(row: &MySqlRow, index: usize) -> Result<SqlValue> {
    let column = &row.columns()[index];
    let raw = row
        .try_get_raw(index)
        .map_err(|e| Error::decode(column.name(), e.to_string()))?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }

    let type_name = column.type_info().name().to_string();
    let decoded = match type_name.as_str() {
        "BOOLEAN" => row.try_get::<bool, _>(index).map(SqlValue::Bool),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<i64, _>(index).map(SqlValue::Int)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row.try_get::<u64, _>(index).map(SqlValue::UInt),
        "FLOAT" => row.try_get::<f32, _>(index).map(|v| SqlValue::Double(f64::from(v))),
        "DOUBLE" => row.try_get::<f64, _>(index).map(SqlValue::Double),
        "DECIMAL" => row.try_get::<Decimal, _>(index).map(SqlValue::Decimal),
        "DATE" => row.try_get::<NaiveDate, _>(index).map(SqlValue::Date),
        "TIME" => row
            .try_get::<NaiveTime, _>(index)
            .map(|t| SqlValue::String(t.to_string())),
        "DATETIME" => row.try_get::<NaiveDateTime, _>(index).map(SqlValue::DateTime),
        "TIMESTAMP" => row.try_get::<DateTime<Utc>, _>(index).map(SqlValue::Timestamp),
        "JSON" => row.try_get::<JsonValue, _>(index).map(SqlValue::Json),
        // information_schema reports some names as binary strings
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => row
            .try_get::<Vec<u8>, _>(index)
            .map(|b| match String::from_utf8(b) {
                Ok(s) => SqlValue::String(s),
                Err(e) => SqlValue::Bytes(e.into_bytes()),
            }),
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

fn decode_row(row: &MySqlRow) -> Result<Row> {
    let columns = row.columns().iter().map(|c| c.name().to_string()).collect();
    let values = (0..row.len())
        .map(|i| decode_value(row, i))
        .collect::<Result<Vec<_>>>()?;
    Ok(Row::new(columns, values))
}

#[async_trait]
impl Querier for MySqlQuerier {
    async fn exec(&self, ctx: &ExecContext, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult> {
        log::debug!("MySQL EXECUTE on '{}': {}", self.name, sql);
        let query = Self::prepare(sql, params);
        let result = ctx
            .run(async {
                query
                    .execute(&self.pool)
                    .await
                    .map_err(|e| Error::driver(DIALECT, sql, e))
            })
            .await?;

        let last_insert_id = match result.last_insert_id() {
            0 => None,
            id => i64::try_from(id).ok(),
        };
        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id,
        })
    }

    async fn query_row(
        &self,
        ctx: &ExecContext,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> Result<Option<Row>> {
        log::debug!("MySQL QUERY ROW on '{}': {}", self.name, sql);
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
        log::debug!("MySQL QUERY on '{}': {}", self.name, sql);
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
