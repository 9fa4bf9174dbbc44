//! Database dialects for the RustF ORM
//!
//! Every vendor-specific behavior hangs off the [`Dialect`] trait. The
//! trait's provided methods are the generic SQL-92 base: `?` placeholders,
//! no RETURNING, an effectively unbounded LIMIT, information_schema
//! introspection. A concrete dialect implements the required accessors and
//! overrides only what its database does differently. Provided methods
//! always call through `self`, so an override is seen by every shared
//! algorithm that depends on it.

pub mod mysql;
pub mod oracle;
pub mod placeholder;
pub mod postgres;
pub mod registry;
pub mod sqlite;
pub mod tables;

pub use mysql::MySQLDialect;
pub use oracle::OracleDialect;
pub use placeholder::{count_marks, rewrite_marks, PlaceholderStyle};
pub use postgres::PostgresDialect;
pub use registry::{dialect_for, DialectRegistry};
pub use sqlite::SQLiteDialect;
pub use tables::{OperatorTable, TypeTable, MARK};

use crate::context::ExecContext;
use crate::database::querier::{Querier, Row};
use crate::database::value::SqlValue;
use crate::error::{Error, Result};
use crate::models::field::{FieldInfo, FieldType};
use crate::models::model::ModelInfo;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Database kinds with a dialect in this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    MySQL,
    SQLite,
    Oracle,
}

impl DatabaseBackend {
    /// Registered short name of the dialect
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseBackend::Postgres => "postgres",
            DatabaseBackend::MySQL => "mysql",
            DatabaseBackend::SQLite => "sqlite3",
            DatabaseBackend::Oracle => "oracle",
        }
    }

    /// Parse a driver name, accepting the usual aliases
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pgsql" => Some(DatabaseBackend::Postgres),
            "mysql" | "mariadb" => Some(DatabaseBackend::MySQL),
            "sqlite" | "sqlite3" => Some(DatabaseBackend::SQLite),
            "oracle" | "oci8" => Some(DatabaseBackend::Oracle),
            _ => None,
        }
    }

    /// Detect the backend from a connection URL scheme
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split_once(':')?.0;
        Self::from_name(scheme)
    }
}

impl fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index hint requested by the query layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexHint {
    Use,
    Force,
    Ignore,
}

/// One column as reported by introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// Operators that wrap their argument into a LIKE pattern
const LIKE_OPERATORS: &[&str] = &[
    "iexact",
    "contains",
    "icontains",
    "startswith",
    "endswith",
    "istartswith",
    "iendswith",
];

/// Quote a string literal for inlining into introspection SQL
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// The dialect capability set
///
/// Implementations must be stateless apart from their immutable tables;
/// one instance is shared by every task that talks to that database kind.
#[async_trait]
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Short registered name, e.g. `postgres`
    fn name(&self) -> &'static str;

    fn backend(&self) -> DatabaseBackend;

    fn operators(&self) -> &OperatorTable;

    /// Column type table used for DDL generation
    fn db_types(&self) -> &TypeTable;

    /// SQL template for a filter operator
    ///
    /// Fails with [`Error::UnknownOperator`] when the operator is not in
    /// this dialect's table.
    fn operator_sql(&self, operator: &str) -> Result<&'static str> {
        self.operators().get(operator)
    }

    /// Wrap the left-hand column of a predicate so `operator` behaves
    /// correctly, e.g. a cast before a LIKE. Called once per predicate.
    fn generate_operator_left_col(
        &self,
        _field: &FieldInfo,
        _operator: &str,
        left_col: &str,
    ) -> String {
        left_col.to_string()
    }

    /// Right-hand side of a predicate plus the values it binds
    ///
    /// Handles the structural operators (`in`, `between`, `isnull`) and
    /// LIKE pattern wrapping; everything else comes from
    /// [`Dialect::operator_sql`].
    fn generate_operator_sql(
        &self,
        _field: &FieldInfo,
        operator: &str,
        args: Vec<SqlValue>,
    ) -> Result<(String, Vec<SqlValue>)> {
        match operator {
            "in" => {
                if args.is_empty() {
                    return Err(Error::invalid_argument("operator 'in' needs at least one value"));
                }
                let marks = vec![MARK.to_string(); args.len()].join(", ");
                Ok((format!("IN ({})", marks), args))
            }
            "between" => {
                if args.len() != 2 {
                    return Err(Error::invalid_argument(format!(
                        "operator 'between' needs exactly 2 values, got {}",
                        args.len()
                    )));
                }
                Ok((format!("BETWEEN {} AND {}", MARK, MARK), args))
            }
            "isnull" => match args.as_slice() {
                [SqlValue::Bool(true)] => Ok(("IS NULL".to_string(), Vec::new())),
                [SqlValue::Bool(false)] => Ok(("IS NOT NULL".to_string(), Vec::new())),
                _ => Err(Error::invalid_argument(
                    "operator 'isnull' needs a single bool value",
                )),
            },
            _ => {
                let arg = match <[SqlValue; 1]>::try_from(args) {
                    Ok([arg]) => arg,
                    Err(args) => {
                        return Err(Error::invalid_argument(format!(
                            "operator '{}' needs exactly 1 value, got {}",
                            operator,
                            args.len()
                        )))
                    }
                };
                let sql = self.operator_sql(operator)?;

                if (operator == "exact" || operator == "strictexact") && arg.is_null() {
                    return Ok(("IS NULL".to_string(), Vec::new()));
                }

                if LIKE_OPERATORS.contains(&operator) {
                    let text = arg.as_text().ok_or_else(|| {
                        Error::invalid_argument(format!(
                            "operator '{}' needs a textual value",
                            operator
                        ))
                    })?;
                    let text = text.replace('%', "\\%");
                    let pattern = match operator {
                        "contains" | "icontains" => format!("%{}%", text),
                        "startswith" | "istartswith" => format!("{}%", text),
                        "endswith" | "iendswith" => format!("%{}", text),
                        _ => text,
                    };
                    return Ok((sql.to_string(), vec![SqlValue::String(pattern)]));
                }

                Ok((sql.to_string(), vec![arg]))
            }
        }
    }

    /// Whether `UPDATE ... JOIN` is legal; when false the query layer
    /// rewrites the update as a primary-key subquery
    fn support_update_join(&self) -> bool {
        true
    }

    /// Largest LIMIT value accepted; 0 means no LIMIT-based cap exists
    fn max_limit(&self) -> u64 {
        u64::MAX
    }

    /// Identifier quote character(s)
    fn table_quote(&self) -> &'static str {
        "`"
    }

    /// Quote an identifier, doubling embedded quote characters
    fn quote(&self, ident: &str) -> String {
        let q = self.table_quote();
        format!("{}{}{}", q, ident.replace(q, &q.repeat(2)), q)
    }

    /// Table reference qualified with the context schema, when one is set
    fn qualify_table(&self, ctx: &ExecContext, table: &str) -> String {
        match ctx.schema() {
            Some(schema) => format!("{}.{}", self.quote(schema), self.quote(table)),
            None => self.quote(table),
        }
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Question
    }

    /// Rewrite neutral markers into this dialect's placeholder syntax
    fn replace_marks<'a>(&self, query: &'a str) -> Cow<'a, str> {
        rewrite_marks(query, self.placeholder_style())
    }

    /// Whether the generated primary key can come back with the INSERT
    ///
    /// When it can and `query` is given, the RETURNING-equivalent clause is
    /// appended to it. When it cannot, `query` is left untouched and the
    /// caller falls back to a last-insert-id round trip.
    fn has_returning_id(&self, _model: &ModelInfo, _query: Option<&mut String>) -> bool {
        false
    }

    /// Tail of an INSERT into `model` that names no column
    fn default_values_insert(&self, _model: &ModelInfo) -> String {
        "DEFAULT VALUES".to_string()
    }

    /// LIMIT/OFFSET clause; `None` means no limit
    fn limit_clause(&self, limit: Option<u64>, offset: u64) -> String {
        match limit {
            Some(limit) if offset > 0 => format!("LIMIT {} OFFSET {}", limit, offset),
            Some(limit) => format!("LIMIT {}", limit),
            None if offset > 0 => match self.max_limit() {
                0 => format!("OFFSET {}", offset),
                max => format!("LIMIT {} OFFSET {}", max, offset),
            },
            None => String::new(),
        }
    }

    /// Storage kind actually used for a field in this dialect
    fn resolve_field_type(&self, field_type: FieldType) -> FieldType {
        match field_type {
            FieldType::Json | FieldType::Jsonb => FieldType::VarChar,
            other => other,
        }
    }

    /// Column type text for a field
    fn column_type(&self, field: &FieldInfo) -> Result<String> {
        let kind = match self.resolve_field_type(field.field_type) {
            FieldType::DateTime if field.time_precision.is_some() => "datetime-precision",
            other => other.kind_key(),
        };
        self.db_types().render(kind, field)
    }

    /// Full column definition tail for an auto-increment key
    fn auto_column(&self, field: &FieldInfo) -> Result<String> {
        Ok(format!(
            "{} {}",
            self.column_type(field)?,
            self.db_types().get("auto")?
        ))
    }

    fn create_table_prefix(&self) -> &'static str {
        "CREATE TABLE IF NOT EXISTS"
    }

    /// CREATE INDEX statement for one column of `table`
    fn create_index_sql(&self, ctx: &ExecContext, table: &str, name: &str, column: &str) -> String {
        format!(
            "CREATE INDEX {} ON {} ({});",
            self.quote(name),
            self.qualify_table(ctx, table),
            self.quote(column)
        )
    }

    /// Inline column comment, where the dialect has one
    fn column_comment(&self, _text: &str) -> Option<String> {
        None
    }

    /// Trailing CREATE TABLE options
    fn table_options(&self, _model: &ModelInfo) -> Option<String> {
        None
    }

    /// Catalog schemas never reported by introspection
    fn system_schemas(&self) -> [&'static str; 2] {
        ["pg_catalog", "information_schema"]
    }

    /// SQL expression naming the connection's current schema, for
    /// dialects that scope introspection to it when no schema is set
    fn current_schema_expr(&self) -> Option<&'static str> {
        None
    }

    /// `column = ...` filter for the active schema, empty when neither a
    /// context schema nor a current-schema expression applies
    fn schema_filter(&self, ctx: &ExecContext, column: &str) -> String {
        match (ctx.schema(), self.current_schema_expr()) {
            (Some(schema), _) => format!(" AND {} = {}", column, quote_literal(schema)),
            (None, Some(expr)) => format!(" AND {} = {}", column, expr),
            (None, None) => String::new(),
        }
    }

    fn system_schema_list(&self) -> String {
        self.system_schemas()
            .iter()
            .map(|s| quote_literal(s))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Query listing base tables
    fn show_tables_query(&self, ctx: &ExecContext) -> String {
        format!(
            "SELECT table_name FROM information_schema.tables WHERE table_type = 'BASE TABLE' AND table_schema NOT IN ({}){}",
            self.system_schema_list(),
            self.schema_filter(ctx, "table_schema")
        )
    }

    /// Query listing `(name, type, nullable)` for a table's columns
    fn show_columns_query(&self, ctx: &ExecContext, table: &str) -> String {
        format!(
            "SELECT column_name, data_type, is_nullable FROM information_schema.columns WHERE table_schema NOT IN ({}) AND table_name = {}{}",
            self.system_schema_list(),
            quote_literal(table),
            self.schema_filter(ctx, "table_schema")
        )
    }

    /// Decode one row of [`Dialect::show_columns_query`]
    fn column_from_row(&self, row: &Row) -> Result<ColumnInfo> {
        let name = row
            .get_string(0)
            .ok_or_else(|| Error::decode("column_name", "missing or not text"))?;
        let data_type = row
            .get_string(1)
            .ok_or_else(|| Error::decode("data_type", "missing or not text"))?;
        let nullable = row
            .get_string(2)
            .map(|v| v.eq_ignore_ascii_case("YES"))
            .unwrap_or(false);
        Ok(ColumnInfo {
            name,
            data_type,
            nullable,
        })
    }

    /// COUNT query for index existence, with neutral markers
    fn index_exists_query(
        &self,
        ctx: &ExecContext,
        table: &str,
        name: &str,
    ) -> (String, Vec<SqlValue>) {
        let mut params = vec![SqlValue::from(table), SqlValue::from(name)];
        let mut sql = format!(
            "SELECT COUNT(*) FROM information_schema.statistics WHERE table_name = {} AND index_name = {}",
            MARK, MARK
        );
        match (ctx.schema(), self.current_schema_expr()) {
            (Some(schema), _) => {
                sql.push_str(&format!(" AND table_schema = {}", MARK));
                params.push(SqlValue::from(schema));
            }
            (None, Some(expr)) => sql.push_str(&format!(" AND table_schema = {}", expr)),
            (None, None) => {}
        }
        (sql, params)
    }

    /// Whether index `name` exists on `table` in the active schema
    ///
    /// No result row counts as "does not exist". Driver errors, including
    /// cancellation, are returned unchanged; a row whose count cannot be
    /// read is a [`Error::Decode`].
    async fn index_exists(
        &self,
        ctx: &ExecContext,
        querier: &dyn Querier,
        table: &str,
        name: &str,
    ) -> Result<bool> {
        let (sql, params) = self.index_exists_query(ctx, table, name);
        let sql = self.replace_marks(&sql).into_owned();

        match querier.query_row(ctx, &sql, params).await? {
            Some(row) => {
                let count = row
                    .get_i64(0)
                    .ok_or_else(|| Error::decode("count", "index count is not an integer"))?;
                Ok(count > 0)
            }
            None => Ok(false),
        }
    }

    /// Names of the base tables visible in the active schema
    async fn get_tables(&self, ctx: &ExecContext, querier: &dyn Querier) -> Result<Vec<String>> {
        let sql = self.show_tables_query(ctx);
        let rows = querier.query_rows(ctx, &sql, Vec::new()).await?;
        rows.iter()
            .map(|row| {
                row.get_string(0)
                    .ok_or_else(|| Error::decode("table_name", "missing or not text"))
            })
            .collect()
    }

    /// Columns of `table` in the active schema
    async fn get_columns(
        &self,
        ctx: &ExecContext,
        querier: &dyn Querier,
        table: &str,
    ) -> Result<Vec<ColumnInfo>> {
        let sql = self.show_columns_query(ctx, table);
        let rows = querier.query_rows(ctx, &sql, Vec::new()).await?;
        rows.iter().map(|row| self.column_from_row(row)).collect()
    }

    /// Index hint clause placed after the table reference
    ///
    /// An unsupported hint is logged and dropped; the query still runs.
    fn generate_specify_index(&self, table: &str, _hint: IndexHint, _indexes: &[String]) -> String {
        log::warn!(
            "{} dialect does not support index hints, ignoring hint on '{}'",
            self.name(),
            table
        );
        String::new()
    }

    /// Whether index hints go right after `SELECT` instead of after the
    /// table reference
    fn index_hint_after_select(&self) -> bool {
        false
    }

    /// Resynchronize auto-increment state after explicit keys were written
    async fn setval(
        &self,
        _ctx: &ExecContext,
        _querier: &dyn Querier,
        _model: &ModelInfo,
        _auto_fields: &[String],
    ) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!(DatabaseBackend::from_name("PostgreSQL"), Some(DatabaseBackend::Postgres));
        assert_eq!(DatabaseBackend::from_name("mariadb"), Some(DatabaseBackend::MySQL));
        assert_eq!(DatabaseBackend::from_name("sqlite"), Some(DatabaseBackend::SQLite));
        assert_eq!(DatabaseBackend::from_name("mssql"), None);
        assert_eq!(DatabaseBackend::SQLite.to_string(), "sqlite3");
    }

    #[test]
    fn test_backend_from_url() {
        assert_eq!(
            DatabaseBackend::from_url("postgres://localhost/app"),
            Some(DatabaseBackend::Postgres)
        );
        assert_eq!(
            DatabaseBackend::from_url("sqlite::memory:"),
            Some(DatabaseBackend::SQLite)
        );
        assert_eq!(DatabaseBackend::from_url("localhost"), None);
    }

    #[test]
    fn test_quote_literal_escapes() {
        assert_eq!(quote_literal("users"), "'users'");
        assert_eq!(quote_literal("o'brien"), "'o''brien'");
    }
}
