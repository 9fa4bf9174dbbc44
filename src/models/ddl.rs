//! CREATE TABLE / CREATE INDEX generation from model descriptors
//!
//! Column types come exclusively from the dialect's type table, so two
//! dialects agree on column order and names and differ only in type text.

use crate::context::ExecContext;
use crate::database::querier::Querier;
use crate::dialect::Dialect;
use crate::error::{ErrorContext, Result};
use crate::models::field::FieldInfo;
use crate::models::model::ModelInfo;

/// One secondary index of a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub name: String,
    pub column: String,
    pub sql: String,
}

/// DDL for one model: the table statement plus its index statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableSql {
    pub table: String,
    pub indexes: Vec<IndexDefinition>,
}

impl CreateTableSql {
    /// Every statement, table first
    pub fn statements(&self) -> Vec<&str> {
        std::iter::once(self.table.as_str())
            .chain(self.indexes.iter().map(|i| i.sql.as_str()))
            .collect()
    }
}

/// Conventional index name for an indexed column
pub fn index_name(table: &str, column: &str) -> String {
    format!("{}_{}", table, column)
}

/// Column definition text, without the leading identifier
pub fn column_definition(dialect: &dyn Dialect, field: &FieldInfo) -> Result<String> {
    if field.auto {
        return dialect.auto_column(field);
    }

    let mut def = dialect.column_type(field)?;

    if field.pk {
        def.push(' ');
        def.push_str(dialect.db_types().get("pk")?);
    } else if !field.null {
        def.push_str(" NOT NULL");
    }

    if let Some(default) = &field.default {
        def.push_str(&format!(" DEFAULT {}", default));
    }

    if field.unique && !field.pk {
        def.push_str(" UNIQUE");
    }

    if let Some(comment) = field.description.as_deref().and_then(|d| dialect.column_comment(d)) {
        def.push(' ');
        def.push_str(&comment);
    }

    Ok(def)
}

/// Build the CREATE TABLE statement and index statements for `model`
pub fn create_table_sql(
    dialect: &dyn Dialect,
    ctx: &ExecContext,
    model: &ModelInfo,
) -> Result<CreateTableSql> {
    let table = dialect.qualify_table(ctx, model.table());

    let columns = model
        .fields()
        .map(|field| {
            let def = column_definition(dialect, field)
                .with_context(|| format!("column '{}' of '{}'", field.column, model.table()))?;
            Ok(format!("    {} {}", dialect.quote(&field.column), def))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut sql = format!(
        "{} {} (\n{}\n)",
        dialect.create_table_prefix(),
        table,
        columns.join(",\n")
    );
    if let Some(options) = dialect.table_options(model) {
        sql.push(' ');
        sql.push_str(&options);
    }
    sql.push(';');

    let indexes = model
        .fields()
        .filter(|f| f.index && !f.pk && !f.unique)
        .map(|field| {
            let name = index_name(model.table(), &field.column);
            let sql = dialect.create_index_sql(ctx, model.table(), &name, &field.column);
            IndexDefinition {
                name,
                column: field.column.clone(),
                sql,
            }
        })
        .collect();

    Ok(CreateTableSql {
        table: sql,
        indexes,
    })
}

/// Create the table if needed, then every missing index
///
/// Returns the names of the indexes that were created. Existing indexes
/// are detected through [`Dialect::index_exists`], so the active schema
/// of `ctx` decides what counts as existing.
pub async fn sync_table(
    dialect: &dyn Dialect,
    ctx: &ExecContext,
    querier: &dyn Querier,
    model: &ModelInfo,
) -> Result<Vec<String>> {
    let ddl = create_table_sql(dialect, ctx, model)?;

    log::info!("Creating table '{}' if missing", model.table());
    querier.exec(ctx, &ddl.table, Vec::new()).await?;

    let mut created = Vec::new();
    for index in &ddl.indexes {
        if dialect
            .index_exists(ctx, querier, model.table(), &index.name)
            .await?
        {
            log::debug!("Index '{}' already exists", index.name);
            continue;
        }
        querier.exec(ctx, &index.sql, Vec::new()).await?;
        log::info!("Created index '{}'", index.name);
        created.push(index.name.clone());
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySQLDialect, PostgresDialect, SQLiteDialect};
    use crate::models::field::FieldType;

    fn accounts() -> ModelInfo {
        ModelInfo::builder("accounts")
            .field(FieldInfo::auto("id", FieldType::BigInteger))
            .field(FieldInfo::new("email", FieldType::VarChar).size(120).unique())
            .field(FieldInfo::new("nick", FieldType::VarChar).nullable().indexed())
            .field(FieldInfo::new("active", FieldType::Boolean).default_value("true"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_postgres_table() {
        let ddl = create_table_sql(&PostgresDialect::new(), &ExecContext::new(), &accounts()).unwrap();
        assert_eq!(
            ddl.table,
            "CREATE TABLE IF NOT EXISTS \"accounts\" (\n    \"id\" bigserial NOT NULL PRIMARY KEY,\n    \"email\" varchar(120) NOT NULL UNIQUE,\n    \"nick\" varchar(255),\n    \"active\" bool NOT NULL DEFAULT true\n);"
        );
        assert_eq!(ddl.indexes.len(), 1);
        assert_eq!(
            ddl.indexes[0].sql,
            "CREATE INDEX \"accounts_nick\" ON \"accounts\" (\"nick\");"
        );
    }

    #[test]
    fn test_schema_qualified_table() {
        let ctx = ExecContext::new().with_schema("tenant_a");
        let ddl = create_table_sql(&PostgresDialect::new(), &ctx, &accounts()).unwrap();
        assert!(ddl.table.starts_with("CREATE TABLE IF NOT EXISTS \"tenant_a\".\"accounts\""));
        assert!(ddl.indexes[0].sql.contains("ON \"tenant_a\".\"accounts\""));
    }

    #[test]
    fn test_mysql_engine_and_comment() {
        let model = ModelInfo::builder("notes")
            .field(FieldInfo::auto("id", FieldType::Integer))
            .field(FieldInfo::new("body", FieldType::Text).description("note's body"))
            .engine("MyISAM")
            .build()
            .unwrap();
        let ddl = create_table_sql(&MySQLDialect::new(), &ExecContext::new(), &model).unwrap();
        assert!(ddl.table.contains("`id` integer AUTO_INCREMENT NOT NULL PRIMARY KEY"));
        assert!(ddl.table.contains("`body` longtext NOT NULL COMMENT 'note''s body'"));
        assert!(ddl.table.ends_with(") ENGINE=MyISAM DEFAULT CHARSET=utf8mb4;"));
    }

    #[test]
    fn test_sqlite_auto_key() {
        let ddl = create_table_sql(&SQLiteDialect::new(), &ExecContext::new(), &accounts()).unwrap();
        assert!(ddl
            .table
            .contains("`id` integer NOT NULL PRIMARY KEY AUTOINCREMENT"));
        assert_eq!(ddl.statements().len(), 2);
    }

    #[test]
    fn test_missing_decimal_precision_names_column() {
        let model = ModelInfo::builder("prices")
            .field(FieldInfo::auto("id", FieldType::Integer))
            .field(FieldInfo::new("amount", FieldType::Decimal))
            .build()
            .unwrap();
        let err = create_table_sql(&PostgresDialect::new(), &ExecContext::new(), &model).unwrap_err();
        assert!(err.to_string().contains("column 'amount' of 'prices'"));
        assert!(err.is_logic_error());
    }
}
