//! Dialect lookup by driver name
//!
//! The built-in dialects are registered once, on first use, and shared as
//! `Arc<dyn Dialect>` afterwards. Applications can build their own
//! [`DialectRegistry`] to add a dialect or replace a built-in one.

use crate::dialect::{
    DatabaseBackend, Dialect, MySQLDialect, OracleDialect, PostgresDialect, SQLiteDialect,
};
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

static BUILTIN: Lazy<DialectRegistry> = Lazy::new(DialectRegistry::builtin);

/// Name → dialect map
#[derive(Debug, Clone, Default)]
pub struct DialectRegistry {
    dialects: HashMap<String, Arc<dyn Dialect>>,
}

impl DialectRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every dialect shipped with the crate, under its
    /// name and the usual driver aliases
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PostgresDialect::new()));
        registry.register(Arc::new(MySQLDialect::new()));
        registry.register(Arc::new(SQLiteDialect::new()));
        registry.register(Arc::new(OracleDialect::new()));
        registry
    }

    /// Register a dialect under its own name, replacing any previous entry
    pub fn register(&mut self, dialect: Arc<dyn Dialect>) {
        let name = dialect.name().to_string();
        if self.dialects.insert(name.clone(), dialect).is_some() {
            log::info!("Replaced registered dialect '{}'", name);
        } else {
            log::debug!("Registered dialect '{}'", name);
        }
    }

    /// Look a dialect up by name or driver alias
    pub fn get(&self, name: &str) -> Result<Arc<dyn Dialect>> {
        if let Some(dialect) = self.dialects.get(name) {
            return Ok(dialect.clone());
        }

        DatabaseBackend::from_name(name)
            .and_then(|backend| self.dialects.get(backend.as_str()))
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown database dialect '{}'", name)))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.dialects.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Built-in dialect for a driver name or alias
pub fn dialect_for(name: &str) -> Result<Arc<dyn Dialect>> {
    BUILTIN.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let registry = DialectRegistry::builtin();
        assert_eq!(registry.names(), vec!["mysql", "oracle", "postgres", "sqlite3"]);
    }

    #[test]
    fn test_aliases_resolve() {
        assert_eq!(dialect_for("sqlite").unwrap().name(), "sqlite3");
        assert_eq!(dialect_for("postgresql").unwrap().name(), "postgres");
        assert_eq!(dialect_for("mariadb").unwrap().name(), "mysql");
    }

    #[test]
    fn test_unknown_dialect() {
        let err = dialect_for("mssql").unwrap_err();
        assert_eq!(err.error_code(), "E_CONFIG");
    }

    #[test]
    fn test_shared_instance() {
        let a = dialect_for("postgres").unwrap();
        let b = dialect_for("postgres").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
