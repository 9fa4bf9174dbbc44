//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use rustf_dialect::database::{Querier, QueryResult, Row, SqlValue};
use rustf_dialect::error::{Error, Result};
use rustf_dialect::models::{FieldInfo, FieldType, ModelInfo};
use rustf_dialect::ExecContext;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One statement seen by [`RecordingQuerier`]
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Querier that records statements and answers from a script
///
/// Each `query_row`/`query_rows` call pops the next scripted response;
/// an empty script answers with no rows.
#[derive(Default)]
pub struct RecordingQuerier {
    recorded: Mutex<Vec<Recorded>>,
    responses: Mutex<VecDeque<Result<Vec<Row>>>>,
    last_insert_id: Option<i64>,
}

impl RecordingQuerier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_last_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }

    pub fn respond(self, rows: Vec<Row>) -> Self {
        self.responses.lock().unwrap().push_back(Ok(rows));
        self
    }

    pub fn fail(self, error: Error) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn statements(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements().into_iter().map(|r| r.sql).collect()
    }

    fn record(&self, sql: &str, params: Vec<SqlValue>) {
        self.recorded.lock().unwrap().push(Recorded {
            sql: sql.to_string(),
            params,
        });
    }

    fn next_response(&self) -> Result<Vec<Row>> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait]
impl Querier for RecordingQuerier {
    async fn exec(&self, ctx: &ExecContext, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult> {
        self.record(sql, params);
        ctx.run(async {
            Ok(QueryResult {
                rows_affected: 1,
                last_insert_id: self.last_insert_id,
            })
        })
        .await
    }

    async fn query_row(
        &self,
        ctx: &ExecContext,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> Result<Option<Row>> {
        self.record(sql, params);
        let rows = ctx.run(async { self.next_response() }).await?;
        Ok(rows.into_iter().next())
    }

    async fn query_rows(
        &self,
        ctx: &ExecContext,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> Result<Vec<Row>> {
        self.record(sql, params);
        ctx.run(async { self.next_response() }).await
    }
}

pub fn count_row(count: i64) -> Row {
    Row::from_values(vec![SqlValue::Int(count)])
}

/// `invoices(id auto, customer varchar indexed, amount decimal(10,2), note text null)`
pub fn invoices() -> ModelInfo {
    ModelInfo::builder("invoices")
        .field(FieldInfo::auto("id", FieldType::Integer))
        .field(FieldInfo::new("customer", FieldType::VarChar).size(80).indexed())
        .field(FieldInfo::new("amount", FieldType::Decimal).decimal(10, 2))
        .field(FieldInfo::new("note", FieldType::Text).nullable())
        .build()
        .unwrap()
}
