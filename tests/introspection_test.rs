mod common;

use common::{count_row, RecordingQuerier};
use rustf_dialect::dialect::{
    ColumnInfo, Dialect, MySQLDialect, OracleDialect, PostgresDialect, SQLiteDialect,
};
use rustf_dialect::{Error, ExecContext, Row, SqlValue};

#[tokio::test]
async fn test_postgres_index_lookup_is_schema_scoped() {
    let dialect = PostgresDialect::new();
    let querier = RecordingQuerier::new()
        .respond(vec![count_row(1)])
        .respond(vec![count_row(0)]);

    let tenant_a = ExecContext::new().with_schema("tenant_a");
    let tenant_b = ExecContext::new().with_schema("tenant_b");

    assert!(dialect
        .index_exists(&tenant_a, &querier, "users", "users_email")
        .await
        .unwrap());
    assert!(!dialect
        .index_exists(&tenant_b, &querier, "users", "users_email")
        .await
        .unwrap());

    let statements = querier.statements();
    assert_eq!(
        statements[0].sql,
        "SELECT COUNT(*) FROM pg_indexes WHERE tablename = $1 AND indexname = $2 AND schemaname = $3"
    );
    assert_eq!(statements[0].params[2], SqlValue::from("tenant_a"));
    assert_eq!(statements[1].params[2], SqlValue::from("tenant_b"));
}

#[tokio::test]
async fn test_postgres_index_lookup_defaults_to_public() {
    let dialect = PostgresDialect::new();
    let querier = RecordingQuerier::new();

    dialect
        .index_exists(&ExecContext::new(), &querier, "users", "users_email")
        .await
        .unwrap();
    assert_eq!(querier.statements()[0].params[2], SqlValue::from("public"));
}

#[tokio::test]
async fn test_mysql_index_lookup_uses_current_database() {
    let dialect = MySQLDialect::new();
    let querier = RecordingQuerier::new();

    dialect
        .index_exists(&ExecContext::new(), &querier, "users", "users_email")
        .await
        .unwrap();
    dialect
        .index_exists(&ExecContext::new().with_schema("shop"), &querier, "users", "users_email")
        .await
        .unwrap();

    let statements = querier.statements();
    assert!(statements[0].sql.ends_with("AND table_schema = DATABASE()"));
    assert_eq!(statements[0].params.len(), 2);
    assert!(statements[1].sql.ends_with("AND table_schema = ?"));
    assert_eq!(statements[1].params[2], SqlValue::from("shop"));
}

#[tokio::test]
async fn test_no_row_means_absent() {
    let querier = RecordingQuerier::new();
    let exists = SQLiteDialect::new()
        .index_exists(&ExecContext::new(), &querier, "users", "users_email")
        .await
        .unwrap();
    assert!(!exists);
}

#[tokio::test]
async fn test_lookup_errors_are_not_swallowed() {
    let dialect = PostgresDialect::new();

    let querier = RecordingQuerier::new().fail(Error::Cancelled);
    let err = dialect
        .index_exists(&ExecContext::new(), &querier, "users", "users_email")
        .await
        .unwrap_err();
    assert!(err.is_interrupted());

    let querier = RecordingQuerier::new().respond(vec![Row::from_values(vec![SqlValue::Null])]);
    let err = dialect
        .index_exists(&ExecContext::new(), &querier, "users", "users_email")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "E_DECODE");
}

#[test]
fn test_show_tables_filters_schema_only_when_set() {
    let pg = PostgresDialect::new();
    let plain = pg.show_tables_query(&ExecContext::new());
    assert!(plain.contains("NOT IN ('pg_catalog', 'information_schema')"));
    assert!(!plain.contains("table_schema ="));

    let scoped = pg.show_tables_query(&ExecContext::new().with_schema("tenant_a"));
    assert!(scoped.ends_with("AND table_schema = 'tenant_a'"));

    let my = MySQLDialect::new().show_tables_query(&ExecContext::new());
    assert!(my.ends_with("AND table_schema = DATABASE()"));
}

#[test]
fn test_show_columns_is_scoped_per_dialect() {
    let ctx = ExecContext::new().with_schema("tenant_a");

    let pg = PostgresDialect::new().show_columns_query(&ctx, "orders");
    assert!(pg.contains("table_name = 'orders'"));
    assert!(pg.ends_with("AND table_schema = 'tenant_a'"));

    let lite = SQLiteDialect::new().show_columns_query(&ExecContext::new(), "orders");
    assert_eq!(lite, "pragma table_info('orders')");

    let ora = OracleDialect::new().show_columns_query(&ctx, "orders");
    assert!(ora.contains("TABLE_NAME = 'ORDERS'"));
    assert!(ora.ends_with("OWNER = 'TENANT_A'"));
    let ora_plain = OracleDialect::new().show_tables_query(&ExecContext::new());
    assert!(ora_plain.ends_with("OWNER = USER"));
}

#[test]
fn test_schema_literal_is_escaped() {
    let sql = PostgresDialect::new().show_tables_query(&ExecContext::new().with_schema("o'brien"));
    assert!(sql.ends_with("table_schema = 'o''brien'"));
}

#[tokio::test]
async fn test_get_tables_and_columns() {
    let dialect = PostgresDialect::new();
    let querier = RecordingQuerier::new()
        .respond(vec![
            Row::from_values(vec![SqlValue::from("orders")]),
            Row::from_values(vec![SqlValue::from("users")]),
        ])
        .respond(vec![
            Row::from_values(vec![
                SqlValue::from("id"),
                SqlValue::from("integer"),
                SqlValue::from("NO"),
            ]),
            Row::from_values(vec![
                SqlValue::from("note"),
                SqlValue::from("text"),
                SqlValue::from("YES"),
            ]),
        ]);
    let ctx = ExecContext::new();

    let tables = dialect.get_tables(&ctx, &querier).await.unwrap();
    assert_eq!(tables, vec!["orders", "users"]);

    let columns = dialect.get_columns(&ctx, &querier, "orders").await.unwrap();
    assert_eq!(
        columns,
        vec![
            ColumnInfo {
                name: "id".into(),
                data_type: "integer".into(),
                nullable: false
            },
            ColumnInfo {
                name: "note".into(),
                data_type: "text".into(),
                nullable: true
            },
        ]
    );
}
