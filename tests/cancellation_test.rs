mod common;

use async_trait::async_trait;
use common::invoices;
use rustf_dialect::database::{Querier, QueryResult, Row, SqlValue};
use rustf_dialect::dialect::{Dialect, PostgresDialect};
use rustf_dialect::error::Result;
use rustf_dialect::models::{insert_one, sync_table};
use rustf_dialect::{CancelToken, ExecContext};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Querier whose every call hangs until the context gives up
#[derive(Default)]
struct StalledQuerier {
    calls: AtomicUsize,
}

impl StalledQuerier {
    async fn stall<T>(&self, ctx: &ExecContext) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ctx.run(std::future::pending()).await
    }
}

#[async_trait]
impl Querier for StalledQuerier {
    async fn exec(&self, ctx: &ExecContext, _sql: &str, _params: Vec<SqlValue>) -> Result<QueryResult> {
        self.stall(ctx).await
    }

    async fn query_row(&self, ctx: &ExecContext, _sql: &str, _params: Vec<SqlValue>) -> Result<Option<Row>> {
        self.stall(ctx).await
    }

    async fn query_rows(&self, ctx: &ExecContext, _sql: &str, _params: Vec<SqlValue>) -> Result<Vec<Row>> {
        self.stall(ctx).await
    }
}

#[tokio::test]
async fn test_cancel_interrupts_index_lookup() {
    let token = CancelToken::new();
    let ctx = ExecContext::new().with_cancel_token(token.clone());
    let querier = StalledQuerier::default();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let err = PostgresDialect::new()
        .index_exists(&ctx, &querier, "invoices", "invoices_customer")
        .await
        .unwrap_err();
    canceller.await.unwrap();

    assert_eq!(err.error_code(), "E_CANCELLED");
}

#[tokio::test]
async fn test_timeout_surfaces_from_insert() {
    let ctx = ExecContext::new().with_timeout(Duration::from_millis(10));
    let querier = StalledQuerier::default();
    let values = vec![("customer", SqlValue::from("acme")), ("amount", SqlValue::Double(1.0))];

    let err = insert_one(&PostgresDialect::new(), &ctx, &querier, &invoices(), &values)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "E_TIMEOUT");
    assert!(err.is_interrupted());
}

#[tokio::test]
async fn test_cancelled_context_stops_sync_at_first_statement() {
    let token = CancelToken::new();
    token.cancel();
    let ctx = ExecContext::new().with_cancel_token(token);
    let querier = StalledQuerier::default();

    let err = sync_table(&PostgresDialect::new(), &ctx, &querier, &invoices())
        .await
        .unwrap_err();
    assert!(err.is_interrupted());
    assert_eq!(querier.calls.load(Ordering::SeqCst), 1);
}
