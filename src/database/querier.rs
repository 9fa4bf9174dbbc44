//! Driver surface the dialect layer executes through
//!
//! Connection pools implement [`Querier`]; the dialect layer only ever sends
//! SQL text plus positional values and reads back affected-row counts, a
//! last insert id, or rows of [`SqlValue`]s.

use crate::context::ExecContext;
use crate::database::value::SqlValue;
use crate::error::Result;
use async_trait::async_trait;

/// Result of a statement executed for its side effects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Number of rows affected by the statement
    pub rows_affected: u64,
    /// Last inserted ID, when the driver reports one
    pub last_insert_id: Option<i64>,
}

/// One result row, columns in select-list order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Row with positional values only
    pub fn from_values(values: Vec<SqlValue>) -> Self {
        Self {
            columns: Vec::new(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Look a value up by column name, case-insensitively
    pub fn get_by_name(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|i| self.values.get(i))
    }

    pub fn get_i64(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(SqlValue::as_i64)
    }

    pub fn get_string(&self, index: usize) -> Option<String> {
        self.get(index).and_then(SqlValue::as_text)
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

/// Execute/query primitives supplied by the connection layer
///
/// Implementations must honor the context through [`ExecContext::run`] so
/// cancellation and timeouts surface as `Error::Cancelled` /
/// `Error::Timeout`, and must not retry.
#[async_trait]
pub trait Querier: Send + Sync {
    /// Execute a statement that modifies data or schema
    async fn exec(
        &self,
        ctx: &ExecContext,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> Result<QueryResult>;

    /// Fetch at most one row
    ///
    /// `Ok(None)` means the statement produced no row.
    async fn query_row(
        &self,
        ctx: &ExecContext,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> Result<Option<Row>>;

    /// Fetch every row
    async fn query_rows(
        &self,
        ctx: &ExecContext,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> Result<Vec<Row>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup() {
        let row = Row::new(
            vec!["COUNT".to_string(), "name".to_string()],
            vec![SqlValue::Int(3), SqlValue::from("idx_users_email")],
        );

        assert_eq!(row.len(), 2);
        assert_eq!(row.get_i64(0), Some(3));
        assert_eq!(row.get_by_name("count"), Some(&SqlValue::Int(3)));
        assert_eq!(row.get_string(1).as_deref(), Some("idx_users_email"));
        assert!(row.get(2).is_none());
    }
}
