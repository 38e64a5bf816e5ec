use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{Document, DocumentStore, Query, StoreError, StoreErrorKind};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Deadline for a single attempt.
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            call_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.min(16))
            .min(self.max_delay)
    }
}

/// Wraps another store with per-call deadlines and bounded exponential
/// backoff. Only transient failures are retried; a missing document or a
/// rejected statement comes back on the first attempt.
pub struct RetryingStore {
    inner: Arc<dyn DocumentStore>,
    policy: RetryPolicy,
}

impl RetryingStore {
    pub fn new(inner: Arc<dyn DocumentStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn run<T, F, Fut>(
        &self,
        op: &'static str,
        collection: &str,
        key: &str,
        mut call: F,
    ) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, StoreError>> + Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            let outcome = match tokio::time::timeout(self.policy.call_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::new(op, collection, key, StoreErrorKind::Timeout)),
            };
            match outcome {
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        op,
                        collection,
                        key,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient store failure; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[async_trait]
impl DocumentStore for RetryingStore {
    fn backend_tag(&self) -> &'static str {
        self.inner.backend_tag()
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.run("get", collection, id, || self.inner.get(collection, id))
            .await
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError> {
        self.run("set", collection, id, || {
            self.inner.set(collection, id, doc.clone())
        })
        .await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        partial: Document,
    ) -> Result<(), StoreError> {
        self.run("update", collection, id, || {
            self.inner.update(collection, id, partial.clone())
        })
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.run("delete", collection, id, || self.inner.delete(collection, id))
            .await
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.run("query", collection, "*", || self.inner.query(collection, query))
            .await
    }

    async fn batch_delete(&self, collection: &str, limit: usize) -> Result<usize, StoreError> {
        self.run("batch_delete", collection, "*", || {
            self.inner.batch_delete(collection, limit)
        })
        .await
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}
