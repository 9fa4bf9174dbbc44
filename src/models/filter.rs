use crate::database::value::SqlValue;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::models::model::ModelInfo;
use std::fmt::Debug;

/// Separator between a field name and its operator, as in `name__icontains`
pub const EXPR_SEP: &str = "__";

/// How a condition joins the conditions before it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

/// One logical predicate: field, operator name and bound values
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: String,
    pub args: Vec<SqlValue>,
    pub connector: Connector,
    pub negate: bool,
}

/// Split `field__operator` into its parts; a bare field means `exact`
pub fn parse_expr(expr: &str) -> (&str, &str) {
    match expr.rsplit_once(EXPR_SEP) {
        Some((field, operator)) if !field.is_empty() && !operator.is_empty() => (field, operator),
        _ => (expr, "exact"),
    }
}

/// A reusable set of conditions in dialect-neutral form
///
/// Example usage:
/// ```rust,ignore
/// let recent = ModelFilter::new()
///     .filter("name__icontains", "smith")
///     .where_between("created", start, end)
///     .exclude("status", "deleted");
///
/// let (sql, params) = render_where(dialect.as_ref(), &model, &recent)?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct ModelFilter {
    conditions: Vec<Condition>,
}

impl ModelFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    fn push(mut self, expr: &str, args: Vec<SqlValue>, connector: Connector, negate: bool) -> Self {
        let (field, operator) = parse_expr(expr);
        self.conditions.push(Condition {
            field: field.to_string(),
            operator: operator.to_string(),
            args,
            connector,
            negate,
        });
        self
    }

    /// Add an AND condition from a `field__operator` expression
    pub fn filter<V: Into<SqlValue>>(self, expr: &str, value: V) -> Self {
        self.push(expr, vec![value.into()], Connector::And, false)
    }

    /// Add an AND condition with several values, e.g. for `in`
    pub fn filter_args(self, expr: &str, values: Vec<SqlValue>) -> Self {
        self.push(expr, values, Connector::And, false)
    }

    /// Add an OR condition
    pub fn or_filter<V: Into<SqlValue>>(self, expr: &str, value: V) -> Self {
        self.push(expr, vec![value.into()], Connector::Or, false)
    }

    /// Add an AND NOT condition
    pub fn exclude<V: Into<SqlValue>>(self, expr: &str, value: V) -> Self {
        self.push(expr, vec![value.into()], Connector::And, true)
    }

    /// Add a WHERE = condition
    pub fn where_eq<V: Into<SqlValue>>(self, field: &str, value: V) -> Self {
        self.push(field, vec![value.into()], Connector::And, false)
    }

    /// Add a WHERE != condition
    pub fn where_ne<V: Into<SqlValue>>(self, field: &str, value: V) -> Self {
        self.filter(&format!("{}__ne", field), value)
    }

    /// Add a WHERE > condition
    pub fn where_gt<V: Into<SqlValue>>(self, field: &str, value: V) -> Self {
        self.filter(&format!("{}__gt", field), value)
    }

    /// Add a WHERE >= condition
    pub fn where_gte<V: Into<SqlValue>>(self, field: &str, value: V) -> Self {
        self.filter(&format!("{}__gte", field), value)
    }

    /// Add a WHERE < condition
    pub fn where_lt<V: Into<SqlValue>>(self, field: &str, value: V) -> Self {
        self.filter(&format!("{}__lt", field), value)
    }

    /// Add a WHERE <= condition
    pub fn where_lte<V: Into<SqlValue>>(self, field: &str, value: V) -> Self {
        self.filter(&format!("{}__lte", field), value)
    }

    /// Add a WHERE IN condition
    pub fn where_in<V: Into<SqlValue>>(self, field: &str, values: Vec<V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.filter_args(&format!("{}__in", field), values)
    }

    /// Add a WHERE NOT IN condition
    pub fn where_not_in<V: Into<SqlValue>>(self, field: &str, values: Vec<V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.push(&format!("{}__in", field), values, Connector::And, true)
    }

    /// Add a WHERE IS NULL condition
    pub fn where_null(self, field: &str) -> Self {
        self.filter(&format!("{}__isnull", field), true)
    }

    /// Add a WHERE IS NOT NULL condition
    pub fn where_not_null(self, field: &str) -> Self {
        self.filter(&format!("{}__isnull", field), false)
    }

    /// Add a WHERE BETWEEN condition
    pub fn where_between<V: Into<SqlValue>>(self, field: &str, start: V, end: V) -> Self {
        self.filter_args(
            &format!("{}__between", field),
            vec![start.into(), end.into()],
        )
    }

    /// Combine with another filter using AND logic
    pub fn and(mut self, other: ModelFilter) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Check if the filter has any conditions
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Get the number of conditions
    pub fn len(&self) -> usize {
        self.conditions.len()
    }
}

/// Render a filter into ` WHERE ...` with neutral markers
///
/// Returns an empty clause for an empty filter. Each predicate goes
/// through the dialect's left-column and operator hooks, so the caller
/// only has to run [`Dialect::replace_marks`] on the finished statement.
pub fn render_where(
    dialect: &dyn Dialect,
    model: &ModelInfo,
    filter: &ModelFilter,
) -> Result<(String, Vec<SqlValue>)> {
    if filter.is_empty() {
        return Ok((String::new(), Vec::new()));
    }

    let mut sql = String::from(" WHERE ");
    let mut params = Vec::new();

    for (i, cond) in filter.conditions().iter().enumerate() {
        let field = model
            .field(&cond.field)
            .or_else(|| model.field_by_column(&cond.field))
            .ok_or_else(|| {
                Error::invalid_argument(format!(
                    "unknown field '{}' on '{}'",
                    cond.field,
                    model.table()
                ))
            })?;

        let left = dialect.quote(&field.column);
        let left = dialect.generate_operator_left_col(field, &cond.operator, &left);
        let (right, args) = dialect.generate_operator_sql(field, &cond.operator, cond.args.clone())?;

        if i > 0 {
            sql.push_str(match cond.connector {
                Connector::And => " AND ",
                Connector::Or => " OR ",
            });
        }
        if cond.negate {
            sql.push_str(&format!("NOT ({} {})", left, right));
        } else {
            sql.push_str(&format!("{} {}", left, right));
        }
        params.extend(args);
    }

    Ok((sql, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySQLDialect, PostgresDialect, SQLiteDialect};
    use crate::models::field::{FieldInfo, FieldType};

    fn users() -> ModelInfo {
        ModelInfo::builder("users")
            .field(FieldInfo::auto("id", FieldType::Integer))
            .field(FieldInfo::new("name", FieldType::VarChar))
            .field(FieldInfo::new("born", FieldType::Date))
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_expr() {
        assert_eq!(parse_expr("name__icontains"), ("name", "icontains"));
        assert_eq!(parse_expr("name"), ("name", "exact"));
        assert_eq!(parse_expr("__gt"), ("__gt", "exact"));
    }

    #[test]
    fn test_postgres_where() {
        let filter = ModelFilter::new()
            .filter("name__icontains", "50%")
            .where_in("id", vec![1, 2, 3]);
        let (sql, params) = render_where(&PostgresDialect::new(), &users(), &filter).unwrap();
        assert_eq!(
            sql,
            " WHERE UPPER(\"name\"::text) LIKE UPPER(?) AND \"id\" IN (?, ?, ?)"
        );
        assert_eq!(params[0], SqlValue::from("%50\\%%"));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_mysql_or_and_not() {
        let filter = ModelFilter::new()
            .where_null("name")
            .or_filter("id__gt", 10)
            .exclude("name__startswith", "x");
        let (sql, params) = render_where(&MySQLDialect::new(), &users(), &filter).unwrap();
        assert_eq!(
            sql,
            " WHERE `name` IS NULL OR `id` > ? AND NOT (`name` LIKE BINARY ?)"
        );
        assert_eq!(params, vec![SqlValue::Int(10), SqlValue::from("x%")]);
    }

    #[test]
    fn test_sqlite_date_column() {
        let filter = ModelFilter::new().where_gte("born", "2000-01-01");
        let (sql, _) = render_where(&SQLiteDialect::new(), &users(), &filter).unwrap();
        assert_eq!(sql, " WHERE DATE(`born`) >= ?");
    }

    #[test]
    fn test_unknown_operator_and_field() {
        let filter = ModelFilter::new().filter("name__regex", "^a");
        let err = render_where(&PostgresDialect::new(), &users(), &filter).unwrap_err();
        assert!(matches!(err, Error::UnknownOperator { .. }));

        let filter = ModelFilter::new().where_eq("nope", 1);
        let err = render_where(&PostgresDialect::new(), &users(), &filter).unwrap_err();
        assert!(err.is_logic_error());
    }

    #[test]
    fn test_empty_filter() {
        let (sql, params) = render_where(&PostgresDialect::new(), &users(), &ModelFilter::new()).unwrap();
        assert!(sql.is_empty() && params.is_empty());
    }
}
