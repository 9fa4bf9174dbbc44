//! PostgreSQL dialect
//!
//! Numbered `$n` placeholders, `RETURNING` for generated keys, sequence
//! resynchronization after explicit key inserts, and schema-scoped
//! introspection defaulting to `public`.

use crate::context::ExecContext;
use crate::database::querier::Querier;
use crate::database::value::SqlValue;
use crate::dialect::tables::{OperatorTable, TypeTable, MARK};
use crate::dialect::{quote_literal, DatabaseBackend, Dialect, PlaceholderStyle};
use crate::error::Result;
use crate::models::field::{FieldInfo, FieldType};
use crate::models::model::ModelInfo;
use async_trait::async_trait;

/// Schema used when the context names none
pub const DEFAULT_SCHEMA: &str = "public";

const OPERATORS: &[(&str, &str)] = &[
    ("exact", "= ?"),
    ("iexact", "= UPPER(?)"),
    ("contains", "LIKE ?"),
    ("icontains", "LIKE UPPER(?)"),
    ("gt", "> ?"),
    ("gte", ">= ?"),
    ("lt", "< ?"),
    ("lte", "<= ?"),
    ("eq", "= ?"),
    ("ne", "!= ?"),
    ("startswith", "LIKE ?"),
    ("endswith", "LIKE ?"),
    ("istartswith", "LIKE UPPER(?)"),
    ("iendswith", "LIKE UPPER(?)"),
];

const TYPES: &[(&str, &str)] = &[
    ("auto", "serial NOT NULL PRIMARY KEY"),
    ("pk", "NOT NULL PRIMARY KEY"),
    ("bool", "bool"),
    ("string", "varchar({size})"),
    ("string-char", "char({size})"),
    ("string-text", "text"),
    ("time-clock", "time"),
    ("date", "date"),
    ("datetime", "timestamp with time zone"),
    ("datetime-precision", "timestamp({precision}) with time zone"),
    ("int8", "smallint CHECK(\"{col}\" >= -127 AND \"{col}\" <= 128)"),
    ("int16", "smallint"),
    ("int32", "integer"),
    ("int64", "bigint"),
    ("uint8", "smallint CHECK(\"{col}\" >= 0 AND \"{col}\" <= 255)"),
    ("uint16", "integer CHECK(\"{col}\" >= 0)"),
    ("uint32", "bigint CHECK(\"{col}\" >= 0)"),
    ("uint64", "bigint CHECK(\"{col}\" >= 0)"),
    ("float64", "double precision"),
    ("float64-decimal", "numeric({digits}, {decimals})"),
    ("json", "json"),
    ("jsonb", "jsonb"),
];

#[derive(Debug, Clone)]
pub struct PostgresDialect {
    operators: OperatorTable,
    types: TypeTable,
}

impl PostgresDialect {
    pub fn new() -> Self {
        Self {
            operators: OperatorTable::new("postgres", OPERATORS),
            types: TypeTable::new("postgres", TYPES),
        }
    }

    /// `schema.table` as a string literal for `pg_get_serial_sequence`
    fn sequence_table(&self, ctx: &ExecContext, table: &str) -> String {
        let name = match ctx.schema() {
            Some(schema) => format!("{}.{}", self.quote(schema), self.quote(table)),
            None => table.to_string(),
        };
        quote_literal(&name)
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
    }

    fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    fn db_types(&self) -> &TypeTable {
        &self.types
    }

    fn generate_operator_left_col(&self, _field: &FieldInfo, operator: &str, left_col: &str) -> String {
        match operator {
            "contains" | "startswith" | "endswith" => format!("{}::text", left_col),
            "iexact" | "icontains" | "istartswith" | "iendswith" => {
                format!("UPPER({}::text)", left_col)
            }
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
        PlaceholderStyle::Numbered('$')
    }

    fn has_returning_id(&self, model: &ModelInfo, query: Option<&mut String>) -> bool {
        let pk = model.pk();
        if !pk.field_type.is_numeric_key() {
            return false;
        }
        if let Some(query) = query {
            query.push_str(&format!(" RETURNING {}", self.quote(&pk.column)));
        }
        true
    }

    fn resolve_field_type(&self, field_type: FieldType) -> FieldType {
        field_type
    }

    fn auto_column(&self, field: &FieldInfo) -> Result<String> {
        match field.field_type {
            FieldType::BigInteger | FieldType::PositiveBigInteger => {
                Ok("bigserial NOT NULL PRIMARY KEY".to_string())
            }
            _ => Ok(self.db_types().get("auto")?.to_string()),
        }
    }

    fn index_exists_query(
        &self,
        ctx: &ExecContext,
        table: &str,
        name: &str,
    ) -> (String, Vec<SqlValue>) {
        let sql = format!(
            "SELECT COUNT(*) FROM pg_indexes WHERE tablename = {m} AND indexname = {m} AND schemaname = {m}",
            m = MARK
        );
        (
            sql,
            vec![
                SqlValue::from(table),
                SqlValue::from(name),
                SqlValue::from(ctx.schema_or(DEFAULT_SCHEMA)),
            ],
        )
    }

    async fn setval(
        &self,
        ctx: &ExecContext,
        querier: &dyn Querier,
        model: &ModelInfo,
        auto_fields: &[String],
    ) -> Result<()> {
        let table = self.qualify_table(ctx, model.table());
        let sequence_table = self.sequence_table(ctx, model.table());

        for column in auto_fields {
            let sql = format!(
                "SELECT setval(pg_get_serial_sequence({}, {}), (SELECT MAX({}) FROM {}));",
                sequence_table,
                quote_literal(column),
                self.quote(column),
                table
            );
            log::debug!("resyncing sequence of {}.{}", model.table(), column);
            querier.exec(ctx, &sql, Vec::new()).await?;
        }
        Ok(())
    }
}
