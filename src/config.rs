//! ORM configuration
//!
//! Read from `config.toml`, overlaid with `config.<env>.toml` when present,
//! then with `RUSTF_*` environment variables:
//!
//! ```toml
//! [orm]
//! default_rows_limit = 1000
//!
//! [databases.main]
//! url = "postgres://app@localhost/app"
//! schema = "public"
//! is_default = true
//! ```

use crate::database::config::DatabasesConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Environment type for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Get environment from string
    pub fn parse(env: &str) -> Self {
        match env.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    /// Suffix of the overlay file, as in `config.dev.toml`
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "dev",
            Environment::Production => "prod",
        }
    }

    /// Environment named by `RUSTF_ENV`, development otherwise
    pub fn detect() -> Self {
        env::var("RUSTF_ENV")
            .map(|e| Self::parse(&e))
            .unwrap_or_default()
    }
}

/// Query-layer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySettings {
    /// Row limit applied to queries that set none; 0 disables it
    #[serde(default = "default_rows_limit")]
    pub default_rows_limit: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_rows_limit: default_rows_limit(),
        }
    }
}

impl QuerySettings {
    pub fn rows_limit(&self) -> Option<u64> {
        (self.default_rows_limit > 0).then_some(self.default_rows_limit)
    }
}

fn default_rows_limit() -> u64 {
    1000
}

/// Top-level ORM configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OrmConfig {
    #[serde(default)]
    pub orm: QuerySettings,

    #[serde(default)]
    pub databases: DatabasesConfig,
}

impl OrmConfig {
    /// Load `config.toml` from the working directory
    pub fn load() -> Result<Self> {
        Self::load_with_base_dir(".")
    }

    /// Load `config.toml` and its environment overlay from `base_dir`
    pub fn load_with_base_dir<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let env = Environment::detect();

        let base_path = base_dir.join("config.toml");
        let mut value = if base_path.exists() {
            load_toml_value(&base_path)?
        } else {
            log::debug!("No config.toml in '{}', using defaults", base_dir.display());
            toml::Value::Table(toml::map::Map::new())
        };

        let env_path = base_dir.join(format!("config.{}.toml", env.as_str()));
        if env_path.exists() {
            log::debug!(
                "Loading environment-specific config from: {}",
                env_path.display()
            );
            let overlay = load_toml_value(&env_path)?;
            value = serde_toml_merge::merge(value, overlay).map_err(|e| {
                Error::config(format!("Failed to merge configuration files: {}", e))
            })?;
        }

        let mut config: OrmConfig = value
            .try_into()
            .map_err(|e: toml::de::Error| Error::config(format!("Invalid configuration: {}", e)))?;
        config.apply_env_overrides()?;
        config.validate()?;

        log::info!(
            "ORM configuration loaded ({} database(s), environment: {})",
            config.databases.len(),
            env.as_str()
        );
        Ok(config)
    }

    /// Load configuration from one TOML file, without overlays
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = fs::read_to_string(path_ref).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path_ref.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| e.with_context(format!("config file '{}'", path_ref.display())))
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: OrmConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// `RUSTF_DATABASE_URL` replaces the default database URL and
    /// `RUSTF_DEFAULT_ROWS_LIMIT` the row limit
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(limit) = env::var("RUSTF_DEFAULT_ROWS_LIMIT") {
            self.orm.default_rows_limit = limit
                .parse()
                .map_err(|_| Error::config("Invalid RUSTF_DEFAULT_ROWS_LIMIT value"))?;
        }

        if let Ok(url) = env::var("RUSTF_DATABASE_URL") {
            let name = self.databases.get_default().map(|(name, _)| name.clone());
            match name.and_then(|n| self.databases.databases.get_mut(&n)) {
                Some(db) => db.url = url,
                None => log::warn!("RUSTF_DATABASE_URL set but no database is configured"),
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.databases.validate()
    }
}

fn load_toml_value(path: &Path) -> Result<toml::Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;
    toml::from_str(&content).map_err(|e| {
        Error::config(format!(
            "Failed to parse config file '{}': {}. Check TOML syntax.",
            path.display(),
            e
        ))
    })
}
