//! RustF dialect layer
//!
//! The SQL dialect abstraction behind the RustF ORM:
//! - one [`Dialect`] trait with PostgreSQL, MySQL, SQLite and Oracle
//!   implementations
//! - operator and column type tables per dialect
//! - `?` placeholder rewriting into native bind syntax
//! - schema-aware DDL, introspection and query building
//! - sqlx-backed queriers and a registry of named databases

// Enforce error handling best practices
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod config;
pub mod context;
pub mod database;
pub mod dialect;
pub mod error;
pub mod models;

// Re-export main types for public API
pub use config::OrmConfig;
pub use context::{CancelToken, ExecContext};
pub use database::{Database, DatabaseRegistry, Querier, QueryResult, Row, SqlValue};
pub use dialect::{dialect_for, DatabaseBackend, Dialect};
pub use error::{Error, Result};

/// Common imports for code built on the dialect layer
pub mod prelude {
    pub use crate::config::OrmConfig;
    pub use crate::context::{CancelToken, ExecContext};
    pub use crate::database::{Database, DatabaseRegistry, Querier, QueryResult, Row, SqlValue};
    pub use crate::dialect::{
        dialect_for, ColumnInfo, DatabaseBackend, Dialect, IndexHint, MySQLDialect,
        OracleDialect, PostgresDialect, SQLiteDialect,
    };
    pub use crate::error::{Error, ErrorContext, Result};
    pub use crate::models::{
        FieldInfo, FieldType, ModelFilter, ModelInfo, ModelQuery, OrderDirection,
    };
}
