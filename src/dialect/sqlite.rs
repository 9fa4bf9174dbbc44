//! SQLite dialect
//!
//! SQLite has no information_schema; introspection goes through
//! `sqlite_master` and `pragma table_info`. An active schema names an
//! attached database.

use crate::context::ExecContext;
use crate::database::querier::Row;
use crate::database::value::SqlValue;
use crate::dialect::tables::{OperatorTable, TypeTable, MARK};
use crate::dialect::{quote_literal, ColumnInfo, DatabaseBackend, Dialect, IndexHint};
use crate::error::{Error, Result};
use crate::models::field::{FieldInfo, FieldType};
use async_trait::async_trait;

const OPERATORS: &[(&str, &str)] = &[
    ("exact", "= ?"),
    ("iexact", "LIKE ? ESCAPE '\\'"),
    ("contains", "LIKE ? ESCAPE '\\'"),
    ("icontains", "LIKE ? ESCAPE '\\'"),
    ("gt", "> ?"),
    ("gte", ">= ?"),
    ("lt", "< ?"),
    ("lte", "<= ?"),
    ("eq", "= ?"),
    ("ne", "!= ?"),
    ("startswith", "LIKE ? ESCAPE '\\'"),
    ("endswith", "LIKE ? ESCAPE '\\'"),
    ("istartswith", "LIKE ? ESCAPE '\\'"),
    ("iendswith", "LIKE ? ESCAPE '\\'"),
];

const TYPES: &[(&str, &str)] = &[
    ("auto", "integer NOT NULL PRIMARY KEY AUTOINCREMENT"),
    ("pk", "NOT NULL PRIMARY KEY"),
    ("bool", "bool"),
    ("string", "varchar({size})"),
    ("string-char", "character({size})"),
    ("string-text", "text"),
    ("time-clock", "time"),
    ("date", "date"),
    ("datetime", "datetime"),
    ("datetime-precision", "datetime({precision})"),
    ("int8", "tinyint"),
    ("int16", "smallint"),
    ("int32", "integer"),
    ("int64", "bigint"),
    ("uint8", "tinyint unsigned"),
    ("uint16", "smallint unsigned"),
    ("uint32", "integer unsigned"),
    ("uint64", "bigint unsigned"),
    ("float64", "real"),
    ("float64-decimal", "decimal"),
];

#[derive(Debug, Clone)]
pub struct SQLiteDialect {
    operators: OperatorTable,
    types: TypeTable,
}

impl SQLiteDialect {
    pub fn new() -> Self {
        Self {
            operators: OperatorTable::new("sqlite3", OPERATORS),
            types: TypeTable::new("sqlite3", TYPES),
        }
    }

    fn master_table(&self, ctx: &ExecContext) -> String {
        match ctx.schema() {
            Some(schema) => format!("{}.sqlite_master", self.quote(schema)),
            None => "sqlite_master".to_string(),
        }
    }
}

impl Default for SQLiteDialect {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dialect for SQLiteDialect {
    fn name(&self) -> &'static str {
        "sqlite3"
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::SQLite
    }

    fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    fn db_types(&self) -> &TypeTable {
        &self.types
    }

    fn generate_operator_left_col(&self, field: &FieldInfo, _operator: &str, left_col: &str) -> String {
        if field.field_type == FieldType::Date {
            format!("DATE({})", left_col)
        } else {
            left_col.to_string()
        }
    }

    fn support_update_join(&self) -> bool {
        false
    }

    fn max_limit(&self) -> u64 {
        i64::MAX as u64
    }

    fn resolve_field_type(&self, field_type: FieldType) -> FieldType {
        match field_type {
            // AUTOINCREMENT only works on an INTEGER PRIMARY KEY
            FieldType::BigInteger => FieldType::Integer,
            FieldType::Json | FieldType::Jsonb => FieldType::VarChar,
            other => other,
        }
    }

    fn auto_column(&self, _field: &FieldInfo) -> Result<String> {
        Ok(self.db_types().get("auto")?.to_string())
    }

    /// The schema qualifies the index name; the table must stay bare
    fn create_index_sql(&self, ctx: &ExecContext, table: &str, name: &str, column: &str) -> String {
        let name = match ctx.schema() {
            Some(schema) => format!("{}.{}", self.quote(schema), self.quote(name)),
            None => self.quote(name),
        };
        format!(
            "CREATE INDEX {} ON {} ({});",
            name,
            self.quote(table),
            self.quote(column)
        )
    }

    fn show_tables_query(&self, ctx: &ExecContext) -> String {
        format!(
            "SELECT name FROM {} WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            self.master_table(ctx)
        )
    }

    fn show_columns_query(&self, ctx: &ExecContext, table: &str) -> String {
        match ctx.schema() {
            Some(schema) => format!("pragma {}.table_info({})", self.quote(schema), quote_literal(table)),
            None => format!("pragma table_info({})", quote_literal(table)),
        }
    }

    fn column_from_row(&self, row: &Row) -> Result<ColumnInfo> {
        // pragma table_info: cid, name, type, notnull, dflt_value, pk
        let name = row
            .get_string(1)
            .ok_or_else(|| Error::decode("name", "missing or not text"))?;
        let data_type = row.get_string(2).unwrap_or_default();
        let nullable = row.get_i64(3).map(|n| n == 0).unwrap_or(true);
        Ok(ColumnInfo {
            name,
            data_type,
            nullable,
        })
    }

    fn index_exists_query(
        &self,
        ctx: &ExecContext,
        table: &str,
        name: &str,
    ) -> (String, Vec<SqlValue>) {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE type = 'index' AND tbl_name = {m} AND name = {m}",
            self.master_table(ctx),
            m = MARK
        );
        (sql, vec![SqlValue::from(table), SqlValue::from(name)])
    }

    fn generate_specify_index(&self, table: &str, hint: IndexHint, indexes: &[String]) -> String {
        match (hint, indexes.first()) {
            (IndexHint::Use | IndexHint::Force, Some(index)) => {
                format!(" INDEXED BY {} ", self.quote(index))
            }
            _ => {
                log::warn!(
                    "sqlite3 only supports a single INDEXED BY hint, ignoring hint on '{}'",
                    table
                );
                String::new()
            }
        }
    }
}
