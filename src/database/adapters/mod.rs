//! sqlx-backed [`Querier`](crate::database::querier::Querier) implementations

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySqlQuerier;
pub use postgres::PostgresQuerier;
pub use sqlite::SqliteQuerier;
