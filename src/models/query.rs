//! Model-scoped query builder
//!
//! Builds SELECT, COUNT, UPDATE and DELETE statements for one model through
//! a [`Dialect`], then runs them through a [`Querier`]. Statements are
//! assembled with neutral markers and rewritten once, at the end.

use crate::context::ExecContext;
use crate::database::querier::{Querier, Row};
use crate::database::value::SqlValue;
use crate::dialect::{Dialect, IndexHint};
use crate::error::{Error, Result};
use crate::models::field::FieldInfo;
use crate::models::filter::{render_where, ModelFilter};
use crate::models::model::ModelInfo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// A finished statement: dialect-native SQL plus positional values
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    fn finish(dialect: &dyn Dialect, sql: String, params: Vec<SqlValue>) -> Self {
        let sql = dialect.replace_marks(&sql).into_owned();
        log::trace!("built statement: {}", sql);
        Self { sql, params }
    }
}

/// Chainable query over one model
#[derive(Debug, Clone)]
pub struct ModelQuery<'a> {
    dialect: &'a dyn Dialect,
    model: &'a ModelInfo,
    filter: ModelFilter,
    columns: Vec<String>,
    order: Vec<(String, OrderDirection)>,
    limit: Option<u64>,
    default_limit: Option<u64>,
    offset: u64,
    hint: Option<(IndexHint, Vec<String>)>,
}

impl<'a> ModelQuery<'a> {
    pub fn new(dialect: &'a dyn Dialect, model: &'a ModelInfo) -> Self {
        Self {
            dialect,
            model,
            filter: ModelFilter::new(),
            columns: Vec::new(),
            order: Vec::new(),
            limit: None,
            default_limit: None,
            offset: 0,
            hint: None,
        }
    }

    /// AND every condition of `filter` into this query
    pub fn apply_filter(mut self, filter: &ModelFilter) -> Self {
        self.filter = self.filter.and(filter.clone());
        self
    }

    /// Add one `field__operator` condition
    pub fn filter<V: Into<SqlValue>>(mut self, expr: &str, value: V) -> Self {
        self.filter = self.filter.filter(expr, value);
        self
    }

    /// Select only these fields, in this order
    pub fn select(mut self, fields: &[&str]) -> Self {
        self.columns = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn order_by(mut self, field: &str, direction: OrderDirection) -> Self {
        self.order.push((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Limit for SELECTs that set none; updates and deletes ignore it
    pub fn default_limit(mut self, limit: Option<u64>) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Set limit and offset for a 1-based page
    pub fn paginate(self, page: u64, per_page: u64) -> Self {
        let offset = page.saturating_sub(1) * per_page;
        self.limit(per_page).offset(offset)
    }

    /// Ask the planner to use one of `indexes`
    pub fn use_index(self, indexes: &[&str]) -> Self {
        self.index_hint(IndexHint::Use, indexes)
    }

    pub fn force_index(self, indexes: &[&str]) -> Self {
        self.index_hint(IndexHint::Force, indexes)
    }

    pub fn ignore_index(self, indexes: &[&str]) -> Self {
        self.index_hint(IndexHint::Ignore, indexes)
    }

    fn index_hint(mut self, hint: IndexHint, indexes: &[&str]) -> Self {
        self.hint = Some((hint, indexes.iter().map(|i| i.to_string()).collect()));
        self
    }

    fn field_of(&self, name: &str) -> Result<&'a FieldInfo> {
        self.model
            .field(name)
            .or_else(|| self.model.field_by_column(name))
            .ok_or_else(|| {
                Error::invalid_argument(format!(
                    "unknown field '{}' on '{}'",
                    name,
                    self.model.table()
                ))
            })
    }

    fn column_of(&self, name: &str) -> Result<String> {
        Ok(self.dialect.quote(&self.field_of(name)?.column))
    }

    fn select_list(&self) -> Result<String> {
        if self.columns.is_empty() {
            let all: Vec<String> = self
                .model
                .fields()
                .map(|f| self.dialect.quote(&f.column))
                .collect();
            return Ok(all.join(", "));
        }
        let cols = self
            .columns
            .iter()
            .map(|c| self.column_of(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(cols.join(", "))
    }

    /// Hint text split into (after SELECT, after table)
    fn hint_parts(&self) -> (String, String) {
        let hint = match &self.hint {
            Some((kind, indexes)) => {
                let text = self
                    .dialect
                    .generate_specify_index(self.model.table(), *kind, indexes);
                text.trim().to_string()
            }
            None => String::new(),
        };
        if hint.is_empty() {
            return (String::new(), String::new());
        }
        if self.dialect.index_hint_after_select() {
            (format!("{} ", hint), String::new())
        } else {
            (String::new(), format!(" {}", hint))
        }
    }

    fn order_clause(&self) -> Result<String> {
        if self.order.is_empty() {
            return Ok(String::new());
        }
        let parts = self
            .order
            .iter()
            .map(|(field, dir)| Ok(format!("{} {}", self.column_of(field)?, dir.as_sql())))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!(" ORDER BY {}", parts.join(", ")))
    }

    fn limit_suffix(&self, limit: Option<u64>) -> String {
        let clause = self.dialect.limit_clause(limit, self.offset);
        if clause.is_empty() {
            clause
        } else {
            format!(" {}", clause)
        }
    }

    /// SELECT statement for the current state
    pub fn build_select(&self, ctx: &ExecContext) -> Result<Statement> {
        let (where_sql, params) = render_where(self.dialect, self.model, &self.filter)?;
        let (head_hint, table_hint) = self.hint_parts();
        let sql = format!(
            "SELECT {}{} FROM {}{}{}{}{}",
            head_hint,
            self.select_list()?,
            self.dialect.qualify_table(ctx, self.model.table()),
            table_hint,
            where_sql,
            self.order_clause()?,
            self.limit_suffix(self.limit.or(self.default_limit))
        );
        Ok(Statement::finish(self.dialect, sql, params))
    }

    /// COUNT statement; limit, offset and ordering are ignored
    pub fn build_count(&self, ctx: &ExecContext) -> Result<Statement> {
        let (where_sql, params) = render_where(self.dialect, self.model, &self.filter)?;
        let (head_hint, table_hint) = self.hint_parts();
        let sql = format!(
            "SELECT {}COUNT(*) FROM {}{}{}",
            head_hint,
            self.dialect.qualify_table(ctx, self.model.table()),
            table_hint,
            where_sql
        );
        Ok(Statement::finish(self.dialect, sql, params))
    }

    /// UPDATE statement setting `values`
    ///
    /// A limited or offset update needs the matching keys from a subquery.
    /// Dialects that support `UPDATE ... JOIN` join against it; the others
    /// filter with `pk IN (subquery)`.
    pub fn build_update(&self, ctx: &ExecContext, values: &[(&str, SqlValue)]) -> Result<Statement> {
        if values.is_empty() {
            return Err(Error::invalid_argument("update needs at least one value"));
        }

        let table = self.dialect.qualify_table(ctx, self.model.table());
        let mut params = Vec::with_capacity(values.len());
        let mut sets = Vec::with_capacity(values.len());
        for (name, value) in values {
            let field = self.field_of(name)?;
            sets.push(format!("{} = ?", self.dialect.quote(&field.column)));
            params.push(value.clone().typed_for(field.field_type));
        }

        let (where_sql, where_params) = render_where(self.dialect, self.model, &self.filter)?;
        let paged = self.limit.is_some() || self.offset > 0;

        let sql = if !paged {
            params.extend(where_params);
            format!("UPDATE {} SET {}{}", table, sets.join(", "), where_sql)
        } else {
            let pk = self.dialect.quote(&self.model.pk().column);
            let sub = format!(
                "SELECT {} FROM {}{}{}{}",
                pk,
                table,
                where_sql,
                self.order_clause()?,
                self.limit_suffix(self.limit)
            );
            if self.dialect.support_update_join() {
                // Join values come first in the statement text
                let mut joined = where_params;
                joined.extend(params);
                params = joined;
                let sets: Vec<String> = sets.iter().map(|s| format!("T0.{}", s)).collect();
                format!(
                    "UPDATE {} T0 INNER JOIN ({}) T1 ON T0.{} = T1.{} SET {}",
                    table,
                    sub,
                    pk,
                    pk,
                    sets.join(", ")
                )
            } else {
                params.extend(where_params);
                format!(
                    "UPDATE {} SET {} WHERE {} IN ({})",
                    table,
                    sets.join(", "),
                    pk,
                    sub
                )
            }
        };

        Ok(Statement::finish(self.dialect, sql, params))
    }

    /// DELETE statement for every matching row
    pub fn build_delete(&self, ctx: &ExecContext) -> Result<Statement> {
        let (where_sql, params) = render_where(self.dialect, self.model, &self.filter)?;
        let sql = format!(
            "DELETE FROM {}{}",
            self.dialect.qualify_table(ctx, self.model.table()),
            where_sql
        );
        Ok(Statement::finish(self.dialect, sql, params))
    }

    /// Fetch every matching row
    pub async fn fetch(&self, ctx: &ExecContext, querier: &dyn Querier) -> Result<Vec<Row>> {
        let stmt = self.build_select(ctx)?;
        querier.query_rows(ctx, &stmt.sql, stmt.params).await
    }

    /// Fetch the first matching row
    pub async fn first(&self, ctx: &ExecContext, querier: &dyn Querier) -> Result<Option<Row>> {
        let stmt = self.clone().limit(1).build_select(ctx)?;
        querier.query_row(ctx, &stmt.sql, stmt.params).await
    }

    pub async fn count(&self, ctx: &ExecContext, querier: &dyn Querier) -> Result<i64> {
        let stmt = self.build_count(ctx)?;
        let row = querier.query_row(ctx, &stmt.sql, stmt.params).await?;
        match row {
            Some(row) => row
                .get_i64(0)
                .ok_or_else(|| Error::decode("count", "count is not an integer")),
            None => Ok(0),
        }
    }

    /// Update matching rows, returning the affected count
    pub async fn update(
        &self,
        ctx: &ExecContext,
        querier: &dyn Querier,
        values: &[(&str, SqlValue)],
    ) -> Result<u64> {
        let stmt = self.build_update(ctx, values)?;
        Ok(querier.exec(ctx, &stmt.sql, stmt.params).await?.rows_affected)
    }

    /// Delete matching rows, returning the affected count
    pub async fn delete(&self, ctx: &ExecContext, querier: &dyn Querier) -> Result<u64> {
        let stmt = self.build_delete(ctx)?;
        Ok(querier.exec(ctx, &stmt.sql, stmt.params).await?.rows_affected)
    }
}
