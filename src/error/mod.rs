use std::time::Duration;
use thiserror::Error;

pub mod context;

pub type Result<T> = std::result::Result<T, Error>;

// Re-export context helpers
pub use context::ErrorContext;

/// Main error type for the dialect layer
///
/// Two families matter to callers: logic errors (the query builder asked a
/// dialect for something it cannot express) and driver errors (the database
/// rejected or never answered a statement). [`Error::is_logic_error`] tells
/// them apart.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Operator '{operator}' is not supported by the {dialect} dialect")]
    UnknownOperator { dialect: String, operator: String },

    #[error("Field kind '{kind}' has no column type in the {dialect} dialect")]
    UnknownFieldKind { dialect: String, kind: String },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{dialect} driver error while executing `{statement}`: {source}")]
    Driver {
        dialect: String,
        statement: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Cannot decode column '{column}': {message}")]
    Decode { column: String, message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Last insert id is not available from the {dialect} driver")]
    LastInsertIdUnavailable { dialect: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    #[error("Internal error: {0}")]
    Internal(String),

    // Error with context chain
    #[error("{message}")]
    WithContext {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn unknown_operator(dialect: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::UnknownOperator {
            dialect: dialect.into(),
            operator: operator.into(),
        }
    }

    pub fn unknown_field_kind(dialect: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnknownFieldKind {
            dialect: dialect.into(),
            kind: kind.into(),
        }
    }

    pub fn invalid_model(msg: impl Into<String>) -> Self {
        Self::InvalidModel(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn driver(
        dialect: impl Into<String>,
        statement: impl Into<String>,
        source: sqlx::Error,
    ) -> Self {
        Self::Driver {
            dialect: dialect.into(),
            statement: statement.into(),
            source,
        }
    }

    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn last_insert_id_unavailable(dialect: impl Into<String>) -> Self {
        Self::LastInsertIdUnavailable {
            dialect: dialect.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn database_connection(msg: impl Into<String>) -> Self {
        Self::DatabaseConnection(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    // Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// True when the query builder emitted something the dialect cannot
    /// express, as opposed to the database rejecting a statement
    pub fn is_logic_error(&self) -> bool {
        match self {
            Error::UnknownOperator { .. }
            | Error::UnknownFieldKind { .. }
            | Error::InvalidModel(_)
            | Error::InvalidArgument(_) => true,
            Error::WithContext { source, .. } => source.is_logic_error(),
            _ => false,
        }
    }

    /// True for cancellation and timeouts inherited from the execution context
    pub fn is_interrupted(&self) -> bool {
        match self {
            Error::Cancelled | Error::Timeout(_) => true,
            Error::WithContext { source, .. } => source.is_interrupted(),
            _ => false,
        }
    }

    /// Get a stable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::UnknownOperator { .. } => "E_UNKNOWN_OPERATOR",
            Error::UnknownFieldKind { .. } => "E_UNKNOWN_FIELD_KIND",
            Error::InvalidModel(_) => "E_INVALID_MODEL",
            Error::InvalidArgument(_) => "E_INVALID_ARGUMENT",
            Error::Driver { .. } => "E_DB_DRIVER",
            Error::Decode { .. } => "E_DECODE",
            Error::Cancelled => "E_CANCELLED",
            Error::Timeout(_) => "E_TIMEOUT",
            Error::LastInsertIdUnavailable { .. } => "E_LAST_INSERT_ID",
            Error::Config(_) => "E_CONFIG",
            Error::Toml(_) => "E_TOML",
            Error::Io(_) => "E_IO",
            Error::DatabaseConnection(_) => "E_DB_CONNECTION",
            Error::Internal(_) => "E_INTERNAL",
            Error::WithContext { source, .. } => source.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logic_errors_are_distinguishable() {
        let err = Error::unknown_operator("postgres", "regex");
        assert!(err.is_logic_error());
        assert_eq!(err.error_code(), "E_UNKNOWN_OPERATOR");
        assert_eq!(
            err.to_string(),
            "Operator 'regex' is not supported by the postgres dialect"
        );

        let driver = Error::driver(
            "postgres",
            "SELECT 1",
            sqlx::Error::Protocol("boom".to_string()),
        );
        assert!(!driver.is_logic_error());
        assert_eq!(driver.error_code(), "E_DB_DRIVER");
    }

    #[test]
    fn test_context_keeps_classification() {
        let err = Error::unknown_field_kind("mysql", "jsonb").with_context("creating table");
        assert!(err.is_logic_error());
        assert_eq!(err.error_code(), "E_UNKNOWN_FIELD_KIND");

        let err = Error::Cancelled.with_context("index lookup");
        assert!(err.is_interrupted());
    }
}
