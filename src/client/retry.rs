//! Timeout and retry policy for coordination clients.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ClientError;

use super::traits::{ClientResult, CoordinationClient};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay between retries in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Default per-call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Retry behaviour applied to every client call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay; attempt `n` waits `n * delay`.
    pub delay: Duration,
    /// Upper bound for a single attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Wraps a client with per-call timeouts and retries of transient errors.
///
/// Timeouts surface as [`ClientError::Timeout`] once retries are exhausted,
/// so a hung backend never blocks a run indefinitely.
///
/// A timed-out write may still have reached the service. When a retried
/// create then finds [`ClientError::NodeExists`], or a retried delete finds
/// [`ClientError::NoNode`], the earlier attempt is taken to have landed.
#[derive(Debug)]
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: CoordinationClient> RetryingClient<C> {
    /// Creates a retrying client.
    #[must_use]
    pub const fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The active policy.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `f` under the policy. `landed` is the error a retry reports
    /// when an earlier attempt already took effect.
    async fn call<T, F, Fut>(
        &self,
        op: &str,
        path: &str,
        landed: Option<&ClientError>,
        f: F,
    ) -> ClientResult<T>
    where
        F: Fn() -> Fut + Send,
        Fut: Future<Output = ClientResult<T>> + Send,
        T: Default + Send,
    {
        let mut last_error = None;

        for attempt in 0..=self.policy.max_retries {
            if attempt > 0 {
                debug!("Retry {attempt}/{} of {op} {path}", self.policy.max_retries);
                tokio::time::sleep(self.policy.delay * attempt).await;
            }

            let outcome = match tokio::time::timeout(self.policy.timeout, f()).await {
                Ok(result) => result,
                Err(_) => Err(ClientError::Timeout(
                    u64::try_from(self.policy.timeout.as_millis()).unwrap_or(u64::MAX),
                )),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if attempt > 0 && landed == Some(&e) => {
                    debug!("{op} {path}: an earlier attempt took effect ({e})");
                    return Ok(T::default());
                }
                Err(e) if e.is_retryable() => {
                    warn!("{op} {path} failed (attempt {}): {e}", attempt + 1);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ClientError::backend("Max retries exceeded")))
    }
}

#[async_trait]
impl<C: CoordinationClient> CoordinationClient for RetryingClient<C> {
    async fn get_value(&self, path: &str) -> ClientResult<Vec<u8>> {
        self.call("get_value", path, None, || self.inner.get_value(path))
            .await
    }

    async fn get_children(&self, path: &str) -> ClientResult<Vec<String>> {
        self.call("get_children", path, None, || self.inner.get_children(path))
            .await
    }

    async fn create(&self, path: &str, value: &[u8]) -> ClientResult<()> {
        let landed = ClientError::NodeExists;
        self.call("create", path, Some(&landed), || self.inner.create(path, value))
            .await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        let landed = ClientError::NoNode;
        self.call("delete", path, Some(&landed), || self.inner.delete(path))
            .await
    }

    async fn set_value(&self, path: &str, value: &[u8]) -> ClientResult<()> {
        self.call("set_value", path, None, || self.inner.set_value(path, value))
            .await
    }

    async fn prepare(&self) -> ClientResult<()> {
        self.inner.prepare().await
    }

    fn backend_type(&self) -> &'static str {
        self.inner.backend_type()
    }
}
