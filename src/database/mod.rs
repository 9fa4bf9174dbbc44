//! Connection layer: values, the querier surface, sqlx adapters and the
//! registry of named databases

pub mod adapters;
pub mod config;
pub mod querier;
pub mod registry;
pub mod value;

// Re-export main types for convenience
pub use adapters::{MySqlQuerier, PostgresQuerier, SqliteQuerier};
pub use config::{DatabaseConnectionConfig, DatabaseConnectionConfigBuilder, DatabasesConfig};
pub use querier::{Querier, QueryResult, Row};
pub use registry::{Database, DatabaseRegistry, RegistryStats};
pub use value::SqlValue;
