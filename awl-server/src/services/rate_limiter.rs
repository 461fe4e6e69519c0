//! Outbound request pacing for the catalog
//!
//! The catalog enforces an implicit global rate limit. Every outbound call
//! goes through one shared [`RequestPacer`]; [`IntervalPacer`] keeps a
//! minimum spacing between calls within this process. Deployments running
//! several instances can plug in a shared limiter behind the same trait.

use crate::models::CatalogEntry;
use crate::services::catalog::{CatalogError, CatalogQuery, CatalogSearch};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Gate awaited before every outbound catalog request
#[async_trait]
pub trait RequestPacer: Send + Sync {
    /// Wait until the next request may be issued
    async fn wait(&self);
}

/// Enforces a minimum interval between consecutive requests
///
/// The timestamp is recorded when a caller is released, just before its
/// request fires, so a slow response does not delay the next call.
pub struct IntervalPacer {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl IntervalPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    pub fn from_millis(min_interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_interval_ms))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

#[async_trait]
impl RequestPacer for IntervalPacer {
    /// Release the caller once `min_interval` has passed since the previous release
    ///
    /// The lock stays held while sleeping. Releasing it before the sleep
    /// would let every concurrent caller read the same timestamp and fire
    /// together when it expires; holding it makes callers leave one interval
    /// apart, in lock order.
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let release_at = previous + self.min_interval;
            if release_at > Instant::now() {
                tracing::debug!(delay = ?(release_at - Instant::now()), "Pacing catalog request");
                tokio::time::sleep_until(release_at).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Catalog wrapper that paces every call through a shared pacer
pub struct RateLimitedCatalog {
    inner: Arc<dyn CatalogSearch>,
    pacer: Arc<dyn RequestPacer>,
}

impl RateLimitedCatalog {
    pub fn new(inner: Arc<dyn CatalogSearch>, pacer: Arc<dyn RequestPacer>) -> Self {
        Self { inner, pacer }
    }

    pub fn pacer(&self) -> Arc<dyn RequestPacer> {
        Arc::clone(&self.pacer)
    }
}

#[async_trait]
impl CatalogSearch for RateLimitedCatalog {
    async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.pacer.wait().await;
        self.inner.search(query).await
    }

    async fn get_by_id(&self, anilist_id: i64) -> Result<Option<CatalogEntry>, CatalogError> {
        self.pacer.wait().await;
        self.inner.get_by_id(anilist_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCatalog {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogSearch for CountingCatalog {
        async fn search(&self, _query: &CatalogQuery) -> Result<Vec<CatalogEntry>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn get_by_id(&self, _id: i64) -> Result<Option<CatalogEntry>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    #[test]
    fn test_pacer_creation() {
        let pacer = IntervalPacer::from_millis(1000);
        assert_eq!(pacer.min_interval(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_immediate() {
        let pacer = IntervalPacer::from_millis(1000);
        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_timing() {
        let pacer = IntervalPacer::from_millis(500);
        let start = Instant::now();

        pacer.wait().await;
        let first_elapsed = start.elapsed();
        pacer.wait().await;
        let second_elapsed = start.elapsed();
        pacer.wait().await;
        let third_elapsed = start.elapsed();

        assert!(first_elapsed < Duration::from_millis(100));
        assert!(second_elapsed >= Duration::from_millis(500));
        assert!(third_elapsed >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_six_calls_span_five_intervals() {
        let inner = Arc::new(CountingCatalog {
            calls: AtomicUsize::new(0),
        });
        let catalog = RateLimitedCatalog::new(
            inner.clone(),
            Arc::new(IntervalPacer::from_millis(1000)),
        );

        let start = Instant::now();
        for _ in 0..6 {
            catalog.search(&CatalogQuery::title("Mushishi")).await.unwrap();
        }

        assert_eq!(inner.calls.load(Ordering::SeqCst), 6);
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert!(start.elapsed() < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_spaced() {
        let pacer = Arc::new(IntervalPacer::from_millis(1000));
        let start = Instant::now();

        let release = |pacer: Arc<IntervalPacer>| async move {
            pacer.wait().await;
            start.elapsed()
        };
        let (a, b, c) = tokio::join!(
            release(Arc::clone(&pacer)),
            release(Arc::clone(&pacer)),
            release(Arc::clone(&pacer)),
        );

        let mut releases = vec![a, b, c];
        releases.sort();
        assert!(releases[0] < Duration::from_millis(10));
        assert!(releases[1] >= Duration::from_secs(1));
        assert!(releases[2] >= Duration::from_secs(2));
        assert!(releases[2] < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_gap_needs_no_wait() {
        let pacer = IntervalPacer::from_millis(1000);
        pacer.wait().await;
        tokio::time::sleep(Duration::from_secs(3)).await;

        let before = Instant::now();
        pacer.wait().await;
        assert!(before.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_by_id_is_paced() {
        let inner = Arc::new(CountingCatalog {
            calls: AtomicUsize::new(0),
        });
        let catalog = RateLimitedCatalog::new(inner, Arc::new(IntervalPacer::from_millis(1000)));

        let start = Instant::now();
        catalog.get_by_id(1).await.unwrap();
        catalog.search(&CatalogQuery::title("x")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(1));
    }
}
