//! Error context and chaining utilities
//!
//! Lets callers record which statement or model was being processed when
//! a dialect or driver call failed.

use super::Error;

/// Trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to the error
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Into<String>;

    /// Add context with lazy evaluation
    fn with_context<C, F>(self, f: F) -> Result<T, Error>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> ErrorContext<T> for Result<T, Error> {
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Into<String>,
    {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, Error>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_chaining() {
        let base_error = Error::unknown_operator("oracle", "icontains");
        let with_context = base_error
            .with_context("rendering filter on users.name")
            .with_context("loading users");

        if let Error::WithContext { message, source } = with_context {
            assert_eq!(message, "loading users");
            if let Error::WithContext { message, source } = source.as_ref() {
                assert_eq!(message, "rendering filter on users.name");
                assert!(matches!(source.as_ref(), Error::UnknownOperator { .. }));
            }
        } else {
            panic!("Expected WithContext error");
        }
    }

    #[test]
    fn test_result_context_is_lazy() {
        let ok: Result<i64, Error> = Ok(3);
        let value = ok
            .with_context(|| -> String { panic!("context built for a success") })
            .unwrap();
        assert_eq!(value, 3);

        let failed: Result<i64, Error> = Err(Error::Cancelled);
        let err = failed.context("index lookup").unwrap_err();
        assert!(err.to_string().contains("index lookup"));
    }
}
