//! Time-bounded memoization of query results per session

use moka::future::Cache;
use quarry_core::DriverError;
use quarry_types::ResultSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Identity of one live session; minted fresh for every connection
pub type SessionId = Uuid;

type CacheKey = (SessionId, String);

/// Query result cache keyed by (session identity, exact query text)
///
/// Query text is not normalized. Expired entries are never returned; moka
/// evicts them in the background. Concurrent misses for the same key are
/// coalesced into one execution.
#[derive(Clone)]
pub struct QueryCache {
    cache: Cache<CacheKey, Arc<ResultSet>>,
    ttl: Duration,
}

impl QueryCache {
    /// Create a cache with the given time-to-live and entry capacity
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();

        Self { cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached rows for `query` on `session`, or run it and store the result
    pub async fn execute<F, Fut>(
        &self,
        session: SessionId,
        query: &str,
        run: F,
    ) -> Result<Arc<ResultSet>, Arc<DriverError>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ResultSet, DriverError>>,
    {
        let key = (session, query.to_string());
        self.cache
            .try_get_with(key, async move {
                tracing::debug!(session = %session, "query cache miss");
                run().await.map(Arc::new)
            })
            .await
    }

    /// Drop every entry recorded for a closed session
    pub fn invalidate_session(&self, session: SessionId) {
        if let Err(e) = self
            .cache
            .invalidate_entries_if(move |key, _| key.0 == session)
        {
            tracing::warn!(session = %session, error = %e, "failed to invalidate cached results");
        }
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// Number of live entries after pending maintenance has run
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn rows(value: &str) -> ResultSet {
        ResultSet::new(vec!["name".into()], vec![vec![json!(value)]])
    }

    async fn run_counted(
        cache: &QueryCache,
        session: SessionId,
        query: &str,
        calls: &AtomicUsize,
    ) -> Result<Arc<ResultSet>, Arc<DriverError>> {
        cache
            .execute(session, query, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(rows("DB1"))
            })
            .await
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = QueryCache::new(Duration::from_secs(240), 100);
        let session = Uuid::new_v4();
        let calls = AtomicUsize::new(0);

        let first = run_counted(&cache, session, "SHOW DATABASES", &calls).await.unwrap();
        let second = run_counted(&cache, session, "SHOW DATABASES", &calls).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_recomputed_once() {
        let cache = QueryCache::new(Duration::from_millis(100), 100);
        let session = Uuid::new_v4();
        let calls = AtomicUsize::new(0);

        run_counted(&cache, session, "SHOW DATABASES", &calls).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        run_counted(&cache, session, "SHOW DATABASES", &calls).await.unwrap();
        run_counted(&cache, session, "SHOW DATABASES", &calls).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_key_includes_session_and_exact_text() {
        let cache = QueryCache::new(Duration::from_secs(240), 100);
        let calls = AtomicUsize::new(0);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        run_counted(&cache, a, "SHOW DATABASES", &calls).await.unwrap();
        run_counted(&cache, b, "SHOW DATABASES", &calls).await.unwrap();
        run_counted(&cache, a, "show databases", &calls).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = QueryCache::new(Duration::from_secs(240), 100);
        let session = Uuid::new_v4();

        let err = cache
            .execute(session, "SELECT 1", || async {
                Err(DriverError::new("warehouse suspended"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.message(), "warehouse suspended");

        let calls = AtomicUsize::new(0);
        run_counted(&cache, session, "SELECT 1", &calls).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_coalesce() {
        let cache = QueryCache::new(Duration::from_secs(240), 100);
        let session = Uuid::new_v4();
        let calls = AtomicUsize::new(0);

        let calls = &calls;
        let slow = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(rows("DB1"))
        };
        let (a, b) = tokio::join!(
            cache.execute(session, "SHOW DATABASES", slow),
            cache.execute(session, "SHOW DATABASES", slow),
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_session() {
        let cache = QueryCache::new(Duration::from_secs(240), 100);
        let keep = Uuid::new_v4();
        let closed = Uuid::new_v4();
        let calls = AtomicUsize::new(0);

        run_counted(&cache, keep, "q", &calls).await.unwrap();
        run_counted(&cache, closed, "q", &calls).await.unwrap();
        assert_eq!(cache.entry_count().await, 2);

        cache.invalidate_session(closed);

        run_counted(&cache, keep, "q", &calls).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        run_counted(&cache, closed, "q", &calls).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
