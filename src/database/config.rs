//! Database configuration structures and parsing
//!
//! Each named connection carries its URL, an optional explicit driver name,
//! the schema its operations default to, and pool sizing.

use crate::dialect::{dialect_for, DatabaseBackend, Dialect, MySQLDialect};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a single database connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConnectionConfig {
    /// Database connection URL (required)
    pub url: String,

    /// Dialect name; detected from the URL scheme when absent
    #[serde(default)]
    pub driver: Option<String>,

    /// Schema used when an operation's context names none
    #[serde(default)]
    pub schema: Option<String>,

    /// MySQL storage engine for created tables
    #[serde(default)]
    pub engine: Option<String>,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Per-statement timeout in seconds, 0 for none
    #[serde(default)]
    pub statement_timeout: u64,

    /// Whether this database should be set as the default
    #[serde(default)]
    pub is_default: bool,
}

impl DatabaseConnectionConfig {
    /// Backend named by `driver`, or detected from the URL
    pub fn backend(&self) -> Result<DatabaseBackend> {
        match &self.driver {
            Some(driver) => DatabaseBackend::from_name(driver)
                .ok_or_else(|| Error::config(format!("Unknown database driver '{}'", driver))),
            None => DatabaseBackend::from_url(&self.url).ok_or_else(|| {
                Error::config(format!(
                    "Cannot detect the database driver from URL '{}'",
                    redact_url(&self.url)
                ))
            }),
        }
    }

    /// Dialect for this connection
    ///
    /// The shared built-in instance is used unless the config changes a
    /// dialect setting, as a MySQL engine does.
    pub fn dialect(&self) -> Result<Arc<dyn Dialect>> {
        let backend = self.backend()?;
        match (backend, &self.engine) {
            (DatabaseBackend::MySQL, Some(engine)) => Ok(Arc::new(MySQLDialect::with_engine(engine))),
            _ => dialect_for(backend.as_str()),
        }
    }

    /// Default schema, never `Some("")`
    pub fn default_schema(&self) -> Option<&str> {
        self.schema.as_deref().filter(|s| !s.is_empty())
    }

    pub fn statement_timeout(&self) -> Option<Duration> {
        (self.statement_timeout > 0).then(|| Duration::from_secs(self.statement_timeout))
    }
}

/// Configuration for multiple databases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DatabasesConfig {
    /// Map of database name to configuration
    #[serde(flatten)]
    pub databases: HashMap<String, DatabaseConnectionConfig>,
}

impl DatabasesConfig {
    /// Create a new empty databases configuration
    pub fn new() -> Self {
        Self {
            databases: HashMap::new(),
        }
    }

    /// Add a database configuration
    pub fn add_database(&mut self, name: impl Into<String>, config: DatabaseConnectionConfig) {
        self.databases.insert(name.into(), config);
    }

    /// Get a database configuration by name
    pub fn get(&self, name: &str) -> Option<&DatabaseConnectionConfig> {
        self.databases.get(name)
    }

    /// Get the default database configuration
    ///
    /// Returns the database marked as default, or the alphabetically first
    /// one if none is marked
    pub fn get_default(&self) -> Option<(&String, &DatabaseConnectionConfig)> {
        if let Some(found) = self.databases.iter().find(|(_, c)| c.is_default) {
            return Some(found);
        }
        self.databases.iter().min_by(|a, b| a.0.cmp(b.0))
    }

    /// Check if any databases are configured
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// Get the number of configured databases
    pub fn len(&self) -> usize {
        self.databases.len()
    }

    /// List all database names, sorted
    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check every entry; more than one default is an error
    pub fn validate(&self) -> Result<()> {
        let defaults = self.databases.values().filter(|c| c.is_default).count();
        if defaults > 1 {
            return Err(Error::config(format!(
                "{} databases are marked as default",
                defaults
            )));
        }
        for (name, config) in &self.databases {
            if config.url.is_empty() {
                return Err(Error::config(format!("Database '{}' has no URL", name)));
            }
            config
                .backend()
                .map_err(|e| e.with_context(format!("database '{}'", name)))?;
        }
        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(&mut self, other: DatabasesConfig) {
        for (name, config) in other.databases {
            self.databases.insert(name, config);
        }
    }
}

/// URL with any password replaced, for log and error messages
pub fn redact_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        }
        Err(_) => "[invalid URL]".to_string(),
    }
}

// Default values for configuration
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    30
}

/// Builder for DatabaseConnectionConfig
pub struct DatabaseConnectionConfigBuilder {
    url: Option<String>,
    driver: Option<String>,
    schema: Option<String>,
    engine: Option<String>,
    max_connections: u32,
    min_connections: u32,
    connect_timeout: u64,
    statement_timeout: u64,
    is_default: bool,
}

impl DatabaseConnectionConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            url: None,
            driver: None,
            schema: None,
            engine: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout: default_connect_timeout(),
            statement_timeout: 0,
            is_default: false,
        }
    }

    /// Set the database URL (required)
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set minimum connections
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Set connection timeout in seconds
    pub fn connect_timeout(mut self, timeout: u64) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-statement timeout in seconds
    pub fn statement_timeout(mut self, timeout: u64) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Mark as default database
    pub fn is_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<DatabaseConnectionConfig> {
        let url = self
            .url
            .ok_or_else(|| Error::config("Database URL is required"))?;

        Ok(DatabaseConnectionConfig {
            url,
            driver: self.driver,
            schema: self.schema,
            engine: self.engine,
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout: self.connect_timeout,
            statement_timeout: self.statement_timeout,
            is_default: self.is_default,
        })
    }
}

impl Default for DatabaseConnectionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
