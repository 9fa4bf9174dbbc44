//! Database registry for managing multiple database connections
//!
//! A [`Database`] pairs a dialect with the querier that talks to the
//! server, plus the defaults its contexts start from. The registry holds
//! them by name and tracks which one is the default.

use crate::config::OrmConfig;
use crate::context::ExecContext;
use crate::database::adapters::{MySqlQuerier, PostgresQuerier, SqliteQuerier};
use crate::database::config::DatabaseConnectionConfig;
use crate::database::querier::Querier;
use crate::database::value::SqlValue;
use crate::dialect::{ColumnInfo, DatabaseBackend, Dialect};
use crate::error::{Error, Result};
use crate::models::{insert_multi, insert_one, sync_table, ModelInfo, ModelQuery};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// A named database: dialect, querier and per-database defaults
#[derive(Clone)]
pub struct Database {
    name: String,
    dialect: Arc<dyn Dialect>,
    querier: Arc<dyn Querier>,
    default_schema: Option<String>,
    statement_timeout: Option<Duration>,
    default_limit: Option<u64>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("dialect", &self.dialect.name())
            .field("default_schema", &self.default_schema)
            .field("statement_timeout", &self.statement_timeout)
            .field("default_limit", &self.default_limit)
            .finish()
    }
}

impl Database {
    pub fn new(
        name: impl Into<String>,
        dialect: Arc<dyn Dialect>,
        querier: Arc<dyn Querier>,
    ) -> Self {
        Self {
            name: name.into(),
            dialect,
            querier,
            default_schema: None,
            statement_timeout: None,
            default_limit: None,
        }
    }

    /// Schema every new context starts with; empty clears it
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        let schema = schema.into();
        self.default_schema = (!schema.is_empty()).then_some(schema);
        self
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    /// Row limit applied to queries that set none
    pub fn with_default_limit(mut self, limit: Option<u64>) -> Self {
        self.default_limit = limit;
        self
    }

    /// Open the connection described by `config`
    pub async fn connect(
        name: impl Into<String>,
        config: &DatabaseConnectionConfig,
    ) -> Result<Self> {
        let name = name.into();
        let dialect = config.dialect()?;
        let querier: Arc<dyn Querier> = match config.backend()? {
            DatabaseBackend::Postgres => Arc::new(PostgresQuerier::connect(&name, config).await?),
            DatabaseBackend::MySQL => Arc::new(MySqlQuerier::connect(&name, config).await?),
            DatabaseBackend::SQLite => Arc::new(SqliteQuerier::connect(&name, config).await?),
            DatabaseBackend::Oracle => {
                return Err(Error::config(format!(
                    "Database '{}': the oracle dialect generates SQL only and has no driver",
                    name
                )))
            }
        };

        let mut database = Self::new(name, dialect, querier);
        if let Some(schema) = config.default_schema() {
            database = database.with_default_schema(schema);
        }
        if let Some(timeout) = config.statement_timeout() {
            database = database.with_statement_timeout(timeout);
        }
        Ok(database)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn querier(&self) -> &dyn Querier {
        self.querier.as_ref()
    }

    pub fn default_schema(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    /// Fresh context carrying this database's schema and timeout
    pub fn context(&self) -> ExecContext {
        let mut ctx = ExecContext::new();
        if let Some(schema) = &self.default_schema {
            ctx = ctx.with_schema(schema.clone());
        }
        if let Some(timeout) = self.statement_timeout {
            ctx = ctx.with_timeout(timeout);
        }
        ctx
    }

    /// Query builder for `model` with the database row limit applied
    pub fn query<'a>(&'a self, model: &'a ModelInfo) -> ModelQuery<'a> {
        ModelQuery::new(self.dialect(), model).default_limit(self.default_limit)
    }

    pub async fn insert(
        &self,
        ctx: &ExecContext,
        model: &ModelInfo,
        values: &[(&str, SqlValue)],
    ) -> Result<Option<i64>> {
        insert_one(self.dialect(), ctx, self.querier(), model, values).await
    }

    pub async fn insert_many(
        &self,
        ctx: &ExecContext,
        model: &ModelInfo,
        rows: &[Vec<(&str, SqlValue)>],
    ) -> Result<u64> {
        insert_multi(self.dialect(), ctx, self.querier(), model, rows).await
    }

    /// Create the model's table and missing indexes
    pub async fn sync(&self, ctx: &ExecContext, model: &ModelInfo) -> Result<Vec<String>> {
        sync_table(self.dialect(), ctx, self.querier(), model)
            .await
            .map_err(|e| e.with_context(format!("sync of '{}' on '{}'", model.table(), self.name)))
    }

    pub async fn index_exists(&self, ctx: &ExecContext, table: &str, index: &str) -> Result<bool> {
        self.dialect
            .index_exists(ctx, self.querier(), table, index)
            .await
    }

    pub async fn tables(&self, ctx: &ExecContext) -> Result<Vec<String>> {
        self.dialect.get_tables(ctx, self.querier()).await
    }

    pub async fn columns(&self, ctx: &ExecContext, table: &str) -> Result<Vec<ColumnInfo>> {
        self.dialect.get_columns(ctx, self.querier(), table).await
    }
}

/// Registry for managing multiple database connections
pub struct DatabaseRegistry {
    databases: Arc<RwLock<HashMap<String, Database>>>,
    /// Name of the default database (if any)
    default: Arc<RwLock<Option<String>>>,
}

impl DatabaseRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            databases: Arc::new(RwLock::new(HashMap::new())),
            default: Arc::new(RwLock::new(None)),
        }
    }

    /// Connect every configured database
    ///
    /// The first connection failure aborts the whole load.
    pub async fn from_config(config: &OrmConfig) -> Result<Self> {
        let registry = Self::new();
        let default_name = config.databases.get_default().map(|(name, _)| name.clone());

        for name in config.databases.list_names() {
            let Some(conn) = config.databases.get(&name) else {
                continue;
            };
            let database = Database::connect(&name, conn)
                .await?
                .with_default_limit(config.orm.rows_limit());
            let is_default = default_name.as_deref() == Some(name.as_str());
            registry.register(database, is_default).await;
        }

        log::info!(
            "Database registry ready with {} database(s)",
            config.databases.len()
        );
        Ok(registry)
    }

    /// Register a database under its own name
    ///
    /// The first database registered becomes the default unless another
    /// is marked later.
    pub async fn register(&self, database: Database, set_as_default: bool) {
        let name = database.name().to_string();
        let mut databases = self.databases.write().await;
        if databases.insert(name.clone(), database).is_some() {
            log::warn!("Replaced database '{}' in registry", name);
        }

        if set_as_default || databases.len() == 1 {
            let mut default = self.default.write().await;
            *default = Some(name);
        }
    }

    /// Get a database by name
    pub async fn get(&self, name: &str) -> Option<Database> {
        let databases = self.databases.read().await;
        databases.get(name).cloned()
    }

    /// Get the default database
    pub async fn get_default(&self) -> Result<Database> {
        let default = self.default.read().await;

        match &*default {
            Some(name) => self.get(name).await.ok_or_else(|| {
                Error::config(format!("Default database '{}' not found in registry", name))
            }),
            None => Err(Error::config("No default database configured")),
        }
    }

    /// Set the default database
    pub async fn set_default(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();

        let databases = self.databases.read().await;
        if !databases.contains_key(&name) {
            return Err(Error::config(format!(
                "Database '{}' not found in registry",
                name
            )));
        }
        drop(databases);

        let mut default = self.default.write().await;
        *default = Some(name);
        Ok(())
    }

    /// List all registered database names, sorted
    pub async fn list_databases(&self) -> Vec<String> {
        let databases = self.databases.read().await;
        let mut names: Vec<String> = databases.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a database is registered
    pub async fn has_database(&self, name: &str) -> bool {
        let databases = self.databases.read().await;
        databases.contains_key(name)
    }

    /// Remove a database; the default cannot be removed
    pub async fn remove(&self, name: &str) -> Result<()> {
        let default = self.default.read().await;
        if default.as_deref() == Some(name) {
            return Err(Error::config(
                "Cannot remove the default database. Set a different default first.",
            ));
        }
        drop(default);

        let mut databases = self.databases.write().await;
        databases
            .remove(name)
            .ok_or_else(|| Error::config(format!("Database '{}' not found", name)))?;
        Ok(())
    }

    /// Clear all databases from the registry
    pub async fn clear(&self) {
        let mut databases = self.databases.write().await;
        databases.clear();

        let mut default = self.default.write().await;
        *default = None;
    }

    /// Get statistics about the registry
    pub async fn stats(&self) -> RegistryStats {
        let databases = self.databases.read().await;
        let default = self.default.read().await;

        let mut database_names: Vec<String> = databases.keys().cloned().collect();
        database_names.sort();
        let mut dialects: Vec<(String, String)> = databases
            .iter()
            .map(|(name, db)| (name.clone(), db.dialect().name().to_string()))
            .collect();
        dialects.sort();

        RegistryStats {
            total_databases: databases.len(),
            default_database: default.clone(),
            database_names,
            dialects,
        }
    }
}

/// Statistics about the database registry
#[derive(Debug, Clone)]
pub struct RegistryStats {
    /// Total number of registered databases
    pub total_databases: usize,
    /// Name of the default database (if any)
    pub default_database: Option<String>,
    /// List of all database names
    pub database_names: Vec<String>,
    /// Dialect name per database
    pub dialects: Vec<(String, String)>,
}

impl Default for DatabaseRegistry {
    fn default() -> Self {
        Self::new()
    }
}
