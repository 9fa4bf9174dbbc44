//! Execution context for dialect and driver calls
//!
//! An [`ExecContext`] is built per logical operation. It carries the active
//! schema consulted by every schema-aware dialect method, and the
//! cancellation/timeout that driver calls made on its behalf inherit.
//!
//! The schema contract: the value is either `None` (use the dialect's
//! default schema) or a non-empty string. Empty strings are normalized to
//! `None` on the way in.

use crate::error::{Error, Result};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Cloneable cancellation handle shared between a caller and its contexts
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every operation running under this token
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Request-scoped context passed to every dialect and querier call
#[derive(Clone, Debug, Default)]
pub struct ExecContext {
    schema: Option<String>,
    timeout: Option<Duration>,
    cancel: Option<CancelToken>,
}

impl ExecContext {
    /// Context with no schema, timeout or cancellation
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the active schema; an empty name clears it
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        let schema = schema.into();
        self.schema = if schema.is_empty() { None } else { Some(schema) };
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The active schema, never `Some("")`
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// The active schema or the given dialect default
    pub fn schema_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.schema().unwrap_or(default)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Drive a driver future under this context's cancellation and timeout
    ///
    /// An already-cancelled context never polls the future. Errors from the
    /// future are returned unchanged.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let guarded = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, fut)
                    .await
                    .map_err(|_| Error::Timeout(limit))?,
                None => fut.await,
            }
        };

        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    res = guarded => res,
                    _ = token.cancelled() => Err(Error::Cancelled),
                }
            }
            None => guarded.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_schema_is_absent() {
        let ctx = ExecContext::new().with_schema("");
        assert_eq!(ctx.schema(), None);
        assert_eq!(ctx.schema_or("public"), "public");

        let ctx = ExecContext::new().with_schema("tenant_a");
        assert_eq!(ctx.schema(), Some("tenant_a"));
        assert_eq!(ctx.schema_or("public"), "tenant_a");
    }

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let ctx = ExecContext::new();
        let value = ctx.run(async { Ok(5) }).await.unwrap();
        assert_eq!(value, 5);

        let err = ctx
            .run(async { Err::<(), _>(Error::internal("driver said no")) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[tokio::test]
    async fn test_cancelled_context_skips_future() {
        let token = CancelToken::new();
        token.cancel();
        let ctx = ExecContext::new().with_cancel_token(token);

        let polled = Arc::new(AtomicBool::new(false));
        let flag = polled.clone();
        let err = ctx
            .run(async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_call() {
        let token = CancelToken::new();
        let ctx = ExecContext::new().with_cancel_token(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout_elapses() {
        let ctx = ExecContext::new().with_timeout(Duration::from_millis(5));
        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout(_)));
    }
}
