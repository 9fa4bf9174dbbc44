//! SQLite querier backed by a sqlx pool

use crate::context::ExecContext;
use crate::database::config::DatabaseConnectionConfig;
use crate::database::querier::{Querier, QueryResult, Row};
use crate::database::value::SqlValue;
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, SqlitePool, TypeInfo, ValueRef};
use std::time::Duration;

const DIALECT: &str = "sqlite3";

/// SQLite querier
#[derive(Clone, Debug)]
pub struct SqliteQuerier {
    name: String,
    pool: SqlitePool,
}

impl SqliteQuerier {
    /// Open a pool for `config`
    ///
    /// An in-memory database lives as long as its connection, so in-memory
    /// URLs get a single long-lived connection.
    pub async fn connect(name: impl Into<String>, config: &DatabaseConnectionConfig) -> Result<Self> {
        let name = name.into();
        let in_memory = config.url.contains(":memory:");
        let mut options = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { config.max_connections })
            .min_connections(if in_memory { 1 } else { config.min_connections })
            .acquire_timeout(Duration::from_secs(config.connect_timeout));
        if in_memory {
            options = options.idle_timeout(None).max_lifetime(None);
        }

        let pool = options.connect(&config.url).await.map_err(|e| {
            Error::database_connection(format!(
                "Failed to connect to SQLite '{}' at {}: {}",
                name, config.url, e
            ))
        })?;

        log::info!("Connected SQLite database '{}'", name);
        Ok(Self { name, pool })
    }

    /// Create querier from existing pool
    pub fn from_pool(name: impl Into<String>, pool: SqlitePool) -> Self {
        Self {
            name: name.into(),
            pool,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn prepare<'q>(sql: &'q str, params: Vec<SqlValue>) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        params.into_iter().fold(sqlx::query(sql), bind_param)
    }
}

fn bind_param<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null | SqlValue::TypedNull(_) => query.bind(None::<i64>), // SQLite accepts NULL for any type
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        // INTEGER is a signed 8-byte value; larger keys go in as text
        SqlValue::UInt(u) => match i64::try_from(u) {
            Ok(i) => query.bind(i),
            Err(_) => query.bind(u.to_string()),
        },
        SqlValue::Double(f) => query.bind(f),
        SqlValue::Decimal(d) => query.bind(d.to_string()),
        SqlValue::String(s) => query.bind(s),
        SqlValue::Bytes(b) => query.bind(b),
        SqlValue::Json(j) => query.bind(j.to_string()),
        SqlValue::Date(d) => query.bind(d),
        SqlValue::DateTime(dt) => query.bind(dt),
        SqlValue::Timestamp(ts) => query.bind(ts),
    }
}

/// SQLite values are dynamically typed, so decoding follows the storage
/// class of the value rather than the declared column type
fn decode_value(row: &SqliteRow, index: usize) -> Result<SqlValue> {
    let column = &row.columns()[index];
    let raw = row
        .try_get_raw(index)
        .map_err(|e| Error::decode(column.name(), e.to_string()))?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let storage = raw.type_info().name().to_string();
    drop(raw);

    let decoded = match storage.as_str() {
        "INTEGER" => row.try_get::<i64, _>(index).map(SqlValue::Int),
        "REAL" => row.try_get::<f64, _>(index).map(SqlValue::Double),
        "BLOB" => row.try_get::<Vec<u8>, _>(index).map(SqlValue::Bytes),
        _ => row.try_get::<String, _>(index).map(SqlValue::String),
    };

    decoded.map_err(|e| {
        log::warn!(
            "Cannot decode column '{}' stored as {}: {}",
            column.name(),
            storage,
            e
        );
        Error::decode(column.name(), format!("unsupported storage class {}", storage))
    })
}

fn decode_row(row: &SqliteRow) -> Result<Row> {
    let columns = row.columns().iter().map(|c| c.name().to_string()).collect();
    let values = (0..row.len())
        .map(|i| decode_value(row, i))
        .collect::<Result<Vec<_>>>()?;
    Ok(Row::new(columns, values))
}

#[async_trait]
impl Querier for SqliteQuerier {
    async fn exec(&self, ctx: &ExecContext, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult> {
        log::debug!("SQLite EXECUTE on '{}': {}", self.name, sql);
        let query = Self::prepare(sql, params);
        let result = ctx
            .run(async {
                query
                    .execute(&self.pool)
                    .await
                    .map_err(|e| Error::driver(DIALECT, sql, e))
            })
            .await?;

        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_rowid()),
        })
    }

    async fn query_row(
        &self,
        ctx: &ExecContext,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> Result<Option<Row>> {
        log::debug!("SQLite QUERY ROW on '{}': {}", self.name, sql);
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
        log::debug!("SQLite QUERY on '{}': {}", self.name, sql);
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
