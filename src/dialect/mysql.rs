//! MySQL / MariaDB dialect
//!
//! Plain `?` placeholders, `LAST_INSERT_ID()` instead of RETURNING, binary
//! comparisons for case-sensitive operators, and `USE/FORCE/IGNORE INDEX`
//! hints. Introspection without a context schema is scoped to
//! `DATABASE()`, the schema named in the connection URL.

use crate::context::ExecContext;
use crate::dialect::tables::{OperatorTable, TypeTable};
use crate::dialect::{quote_literal, DatabaseBackend, Dialect, IndexHint};
use crate::models::model::ModelInfo;
use async_trait::async_trait;

const OPERATORS: &[(&str, &str)] = &[
    ("exact", "= ?"),
    ("iexact", "LIKE ?"),
    ("strictexact", "= BINARY ?"),
    ("contains", "LIKE BINARY ?"),
    ("icontains", "LIKE ?"),
    ("gt", "> ?"),
    ("gte", ">= ?"),
    ("lt", "< ?"),
    ("lte", "<= ?"),
    ("eq", "= ?"),
    ("ne", "!= ?"),
    ("startswith", "LIKE BINARY ?"),
    ("endswith", "LIKE BINARY ?"),
    ("istartswith", "LIKE ?"),
    ("iendswith", "LIKE ?"),
];

const TYPES: &[(&str, &str)] = &[
    ("auto", "AUTO_INCREMENT NOT NULL PRIMARY KEY"),
    ("pk", "NOT NULL PRIMARY KEY"),
    ("bool", "bool"),
    ("string", "varchar({size})"),
    ("string-char", "char({size})"),
    ("string-text", "longtext"),
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
    ("float64", "double precision"),
    ("float64-decimal", "numeric({digits}, {decimals})"),
    ("json", "json"),
];

/// Storage engine used when neither the model nor the config names one
pub const DEFAULT_ENGINE: &str = "INNODB";

#[derive(Debug, Clone)]
pub struct MySQLDialect {
    operators: OperatorTable,
    types: TypeTable,
    engine: String,
}

impl MySQLDialect {
    pub fn new() -> Self {
        Self::with_engine(DEFAULT_ENGINE)
    }

    /// Dialect whose tables default to `engine`
    pub fn with_engine(engine: impl Into<String>) -> Self {
        Self {
            operators: OperatorTable::new("mysql", OPERATORS),
            types: TypeTable::new("mysql", TYPES),
            engine: engine.into(),
        }
    }

    pub fn default_engine(&self) -> &str {
        &self.engine
    }
}

impl Default for MySQLDialect {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dialect for MySQLDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::MySQL
    }

    fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    fn db_types(&self) -> &TypeTable {
        &self.types
    }

    fn default_values_insert(&self, _model: &ModelInfo) -> String {
        "() VALUES ()".to_string()
    }

    fn column_comment(&self, text: &str) -> Option<String> {
        Some(format!(
            "COMMENT '{}'",
            text.replace('\\', "\\\\").replace('\'', "''")
        ))
    }

    fn table_options(&self, model: &ModelInfo) -> Option<String> {
        let engine = model.engine().unwrap_or(&self.engine);
        Some(format!("ENGINE={} DEFAULT CHARSET=utf8mb4", engine))
    }

    fn system_schemas(&self) -> [&'static str; 2] {
        ["information_schema", "mysql"]
    }

    fn current_schema_expr(&self) -> Option<&'static str> {
        Some("DATABASE()")
    }

    fn show_columns_query(&self, ctx: &ExecContext, table: &str) -> String {
        format!(
            "SELECT column_name, column_type, is_nullable FROM information_schema.columns WHERE table_schema NOT IN ({}) AND table_name = {}{}",
            self.system_schema_list(),
            quote_literal(table),
            self.schema_filter(ctx, "table_schema")
        )
    }

    fn generate_specify_index(&self, _table: &str, hint: IndexHint, indexes: &[String]) -> String {
        let keyword = match hint {
            IndexHint::Use => "USE",
            IndexHint::Force => "FORCE",
            IndexHint::Ignore => "IGNORE",
        };
        let names: Vec<String> = indexes.iter().map(|i| self.quote(i)).collect();
        format!(" {} INDEX({}) ", keyword, names.join(","))
    }
}
