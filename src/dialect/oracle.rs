//! Oracle dialect
//!
//! `:n` placeholders, identity columns, `OFFSET .. FETCH NEXT` paging and
//! `ALL_*` catalog views filtered by owner. There is no sqlx driver for
//! Oracle, so this dialect generates SQL for any [`Querier`] the caller
//! supplies.
//!
//! [`Querier`]: crate::database::querier::Querier

use crate::context::ExecContext;
use crate::database::querier::Row;
use crate::database::value::SqlValue;
use crate::dialect::tables::{OperatorTable, TypeTable, MARK};
use crate::dialect::{
    quote_literal, ColumnInfo, DatabaseBackend, Dialect, IndexHint, PlaceholderStyle,
};
use crate::error::{Error, Result};
use crate::models::field::FieldInfo;
use crate::models::model::ModelInfo;
use async_trait::async_trait;

const OPERATORS: &[(&str, &str)] = &[
    ("exact", "= ?"),
    ("iexact", "= UPPER(?)"),
    ("contains", "LIKE ? ESCAPE '\\'"),
    ("icontains", "LIKE UPPER(?) ESCAPE '\\'"),
    ("gt", "> ?"),
    ("gte", ">= ?"),
    ("lt", "< ?"),
    ("lte", "<= ?"),
    ("eq", "= ?"),
    ("ne", "!= ?"),
    ("startswith", "LIKE ? ESCAPE '\\'"),
    ("endswith", "LIKE ? ESCAPE '\\'"),
    ("istartswith", "LIKE UPPER(?) ESCAPE '\\'"),
    ("iendswith", "LIKE UPPER(?) ESCAPE '\\'"),
];

const TYPES: &[(&str, &str)] = &[
    ("auto", "GENERATED BY DEFAULT AS IDENTITY NOT NULL PRIMARY KEY"),
    ("pk", "NOT NULL PRIMARY KEY"),
    ("bool", "NUMBER(1)"),
    ("string", "VARCHAR2({size})"),
    ("string-char", "CHAR({size})"),
    ("string-text", "CLOB"),
    ("time-clock", "TIMESTAMP"),
    ("date", "DATE"),
    ("datetime", "TIMESTAMP"),
    ("datetime-precision", "TIMESTAMP({precision})"),
    ("int8", "INTEGER"),
    ("int16", "INTEGER"),
    ("int32", "INTEGER"),
    ("int64", "INTEGER"),
    ("uint8", "INTEGER"),
    ("uint16", "INTEGER"),
    ("uint32", "INTEGER"),
    ("uint64", "INTEGER"),
    ("float64", "NUMBER"),
    ("float64-decimal", "NUMBER({digits}, {decimals})"),
];

#[derive(Debug, Clone)]
pub struct OracleDialect {
    operators: OperatorTable,
    types: TypeTable,
}

impl OracleDialect {
    pub fn new() -> Self {
        Self {
            operators: OperatorTable::new("oracle", OPERATORS),
            types: TypeTable::new("oracle", TYPES),
        }
    }

    /// `OWNER` filter; Oracle identifiers are stored upper case
    fn owner_filter(&self, ctx: &ExecContext, column: &str) -> String {
        match ctx.schema() {
            Some(schema) => format!("{} = {}", column, quote_literal(&schema.to_uppercase())),
            None => format!("{} = USER", column),
        }
    }
}

impl Default for OracleDialect {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Oracle
    }

    fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    fn db_types(&self) -> &TypeTable {
        &self.types
    }

    fn generate_operator_left_col(&self, _field: &FieldInfo, operator: &str, left_col: &str) -> String {
        match operator {
            "iexact" | "icontains" | "istartswith" | "iendswith" => format!("UPPER({})", left_col),
            _ => left_col.to_string(),
        }
    }

    fn support_update_join(&self) -> bool {
        false
    }

    fn max_limit(&self) -> u64 {
        0
    }

    fn table_quote(&self) -> &'static str {
        "\""
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Numbered(':')
    }

    fn limit_clause(&self, limit: Option<u64>, offset: u64) -> String {
        match limit {
            Some(limit) => format!("OFFSET {} ROWS FETCH NEXT {} ROWS ONLY", offset, limit),
            None if offset > 0 => format!("OFFSET {} ROWS", offset),
            None => String::new(),
        }
    }

    fn create_table_prefix(&self) -> &'static str {
        "CREATE TABLE"
    }

    /// Oracle has no `DEFAULT VALUES`; the key column takes its default
    fn default_values_insert(&self, model: &ModelInfo) -> String {
        format!("({}) VALUES (DEFAULT)", self.quote(&model.pk().column))
    }

    fn system_schemas(&self) -> [&'static str; 2] {
        ["SYS", "SYSTEM"]
    }

    fn show_tables_query(&self, ctx: &ExecContext) -> String {
        format!(
            "SELECT TABLE_NAME FROM ALL_TABLES WHERE OWNER NOT IN ({}) AND {}",
            self.system_schema_list(),
            self.owner_filter(ctx, "OWNER")
        )
    }

    fn show_columns_query(&self, ctx: &ExecContext, table: &str) -> String {
        format!(
            "SELECT COLUMN_NAME, DATA_TYPE, NULLABLE FROM ALL_TAB_COLUMNS WHERE OWNER NOT IN ({}) AND TABLE_NAME = {} AND {}",
            self.system_schema_list(),
            quote_literal(&table.to_uppercase()),
            self.owner_filter(ctx, "OWNER")
        )
    }

    fn column_from_row(&self, row: &Row) -> Result<ColumnInfo> {
        let name = row
            .get_string(0)
            .ok_or_else(|| Error::decode("COLUMN_NAME", "missing or not text"))?;
        let data_type = row.get_string(1).unwrap_or_default();
        let nullable = row.get_string(2).map(|v| v == "Y").unwrap_or(true);
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
        let mut params = vec![
            SqlValue::from(table.to_uppercase()),
            SqlValue::from(name.to_uppercase()),
        ];
        let owner = match ctx.schema() {
            Some(schema) => {
                params.push(SqlValue::from(schema.to_uppercase()));
                format!("TABLE_OWNER = {}", MARK)
            }
            None => "TABLE_OWNER = USER".to_string(),
        };
        let sql = format!(
            "SELECT COUNT(*) FROM ALL_INDEXES WHERE TABLE_NAME = {m} AND INDEX_NAME = {m} AND {}",
            owner,
            m = MARK
        );
        (sql, params)
    }

    fn generate_specify_index(&self, table: &str, hint: IndexHint, indexes: &[String]) -> String {
        let keyword = match hint {
            IndexHint::Use | IndexHint::Force => "INDEX",
            IndexHint::Ignore => "NO_INDEX",
        };
        let names: Vec<String> = indexes.iter().map(|i| self.quote(i)).collect();
        format!(" /*+ {}({} {})*/ ", keyword, self.quote(table), names.join(","))
    }

    fn index_hint_after_select(&self) -> bool {
        true
    }
}
