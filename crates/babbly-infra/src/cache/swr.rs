//! Keyed stale-while-revalidate cache.
//!
//! Holds the last good value per key and at most one in-flight fetch per
//! key. Callers asking for a key that is already being fetched attach to the
//! pending result instead of issuing another request.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use babbly_core::{ApiError, ApiResult};

use crate::config::CacheConfig;

/// Produces a fresh value for a key.
pub type Fetcher<V> = Arc<dyn Fn() -> BoxFuture<'static, ApiResult<V>> + Send + Sync>;

type SharedFetch<V> = Shared<BoxFuture<'static, ApiResult<Arc<V>>>>;

/// Wrap an async closure as a [`Fetcher`].
pub fn fetcher<V, F, Fut>(f: F) -> Fetcher<V>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResult<V>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Change notifications, so views sharing a key can re-render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Updated(String),
    Invalidated(String),
    Failed { key: String, error: ApiError },
}

/// What a view shows right now for a key.
#[derive(Debug, Clone)]
pub struct Snapshot<V> {
    pub data: Option<Arc<V>>,
    pub is_validating: bool,
    pub error: Option<ApiError>,
}

/// A running fetch. `id` is unique per cache, so a result can only land in
/// the entry that started it.
struct InFlight<V> {
    id: u64,
    // Entry version when the fetch started.
    version: u64,
    cancel: CancellationToken,
    fetch: SharedFetch<V>,
}

struct Entry<V> {
    data: Option<Arc<V>>,
    fetched_at: Option<Instant>,
    error: Option<ApiError>,
    inflight: Option<InFlight<V>>,
    fetcher: Option<Fetcher<V>>,
    last_focus: Option<Instant>,
    // Bumped by local writes; a fetch started before a write does not
    // overwrite it.
    version: u64,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            data: None,
            fetched_at: None,
            error: None,
            inflight: None,
            fetcher: None,
            last_focus: None,
            version: 0,
        }
    }
}

impl<V> Entry<V> {
    /// Abort the network work of a fetch whose entry is being dropped.
    fn discard(self) {
        if let Some(inflight) = self.inflight {
            inflight.cancel.cancel();
        }
    }
}

struct Inner<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    config: CacheConfig,
    events: broadcast::Sender<CacheEvent>,
    shutdown: CancellationToken,
    next_fetch: AtomicU64,
}

impl<V> Inner<V> {
    fn emit(&self, event: CacheEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    async fn complete(&self, key: &str, id: u64, version: u64, result: ApiResult<V>) -> ApiResult<Arc<V>> {
        let result = result.map(Arc::new);
        let mut entries = self.entries.lock().await;

        // Gone or replaced: the key was invalidated, or a newer fetch took
        // over after a local write. Either way this result is not the entry's.
        let Some(entry) = entries
            .get_mut(key)
            .filter(|e| e.inflight.as_ref().is_some_and(|f| f.id == id))
        else {
            tracing::debug!(key, fetch_id = id, "Discarding result of superseded fetch");
            return result;
        };
        entry.inflight = None;

        match &result {
            Ok(data) => {
                entry.error = None;
                if entry.version == version {
                    entry.data = Some(data.clone());
                    entry.fetched_at = Some(Instant::now());
                    self.emit(CacheEvent::Updated(key.to_string()));
                } else {
                    tracing::debug!(key, "Discarding fetch result older than local write");
                }
            }
            Err(error) => {
                entry.error = Some(error.clone());
                self.emit(CacheEvent::Failed {
                    key: key.to_string(),
                    error: error.clone(),
                });
            }
        }

        result
    }
}

/// In-memory SWR cache. Cheap to clone; clones share state.
pub struct SwrCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for SwrCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V> SwrCache<V>
where
    V: Send + Sync + 'static,
{
    /// `shutdown` aborts every fetch this cache starts when cancelled.
    pub fn new(config: CacheConfig, shutdown: CancellationToken) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                config,
                events,
                shutdown,
                next_fetch: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    /// Current value without triggering anything.
    pub async fn get(&self, key: &str) -> Option<Arc<V>> {
        let entries = self.inner.entries.lock().await;
        entries.get(key).and_then(|e| e.data.clone())
    }

    pub async fn snapshot(&self, key: &str) -> Snapshot<V> {
        let entries = self.inner.entries.lock().await;
        match entries.get(key) {
            Some(entry) => Snapshot {
                data: entry.data.clone(),
                is_validating: entry.inflight.is_some(),
                error: entry.error.clone(),
            },
            None => Snapshot {
                data: None,
                is_validating: false,
                error: None,
            },
        }
    }

    /// Value for `key`, fetching only when there is no result younger than
    /// the dedup interval. Concurrent callers share one request.
    pub async fn fetch(
        &self,
        key: &str,
        fetcher: Fetcher<V>,
        cancel: &CancellationToken,
    ) -> ApiResult<Arc<V>> {
        let pending = {
            let mut entries = self.inner.entries.lock().await;
            if let Some(data) = entries.get(key).and_then(|e| self.fresh(e)) {
                tracing::trace!(key, "Serving deduplicated result");
                return Ok(data);
            }
            self.start_locked(&mut entries, key, fetcher)
        };

        wait(pending, cancel).await
    }

    /// Like [`fetch`](Self::fetch) but ignores the dedup interval. Still
    /// attaches to a request that is already in flight.
    pub async fn fetch_fresh(
        &self,
        key: &str,
        fetcher: Fetcher<V>,
        cancel: &CancellationToken,
    ) -> ApiResult<Arc<V>> {
        let pending = {
            let mut entries = self.inner.entries.lock().await;
            self.start_locked(&mut entries, key, fetcher)
        };

        wait(pending, cancel).await
    }

    /// Return what is cached now and refresh it in the background.
    pub async fn peek_and_revalidate(&self, key: &str, fetcher: Fetcher<V>) -> Snapshot<V> {
        let mut entries = self.inner.entries.lock().await;

        let fresh = entries.get(key).and_then(|e| self.fresh(e)).is_some();
        if !fresh {
            self.start_locked(&mut entries, key, fetcher);
        }

        let entry = entries.get(key);
        Snapshot {
            data: entry.and_then(|e| e.data.clone()),
            is_validating: entry.is_some_and(|e| e.inflight.is_some()),
            error: entry.and_then(|e| e.error.clone()),
        }
    }

    /// Refresh `key` in the background with the fetcher it was last loaded
    /// with. Returns false when the key was never fetched.
    pub async fn revalidate(&self, key: &str) -> bool {
        let mut entries = self.inner.entries.lock().await;
        let Some(fetcher) = entries.get(key).and_then(|e| e.fetcher.clone()) else {
            return false;
        };
        self.start_locked(&mut entries, key, fetcher);
        true
    }

    /// Revalidate every fetched key under `prefix`. Returns how many started.
    pub async fn revalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.inner.entries.lock().await;
        let targets: Vec<(String, Fetcher<V>)> = entries
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .filter_map(|(k, e)| e.fetcher.clone().map(|f| (k.clone(), f)))
            .collect();

        for (key, fetcher) in &targets {
            self.start_locked(&mut entries, key, fetcher.clone());
        }
        targets.len()
    }

    /// Revalidate because the user came back to the view, at most once per
    /// focus throttle interval.
    pub async fn revalidate_on_focus(&self, key: &str) -> bool {
        {
            let mut entries = self.inner.entries.lock().await;
            let Some(entry) = entries.get_mut(key) else {
                return false;
            };
            let now = Instant::now();
            if entry
                .last_focus
                .is_some_and(|at| now.duration_since(at) < self.inner.config.focus_throttle)
            {
                return false;
            }
            entry.last_focus = Some(now);
        }
        self.revalidate(key).await
    }

    /// Apply a local write. `update` sees the current value and returns the
    /// replacement, or `None` to leave it alone. Returns the value `update`
    /// saw.
    pub async fn mutate<F>(&self, key: &str, update: F) -> Option<Arc<V>>
    where
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        let mut entries = self.inner.entries.lock().await;
        let entry = entries.entry(key.to_string()).or_default();
        let previous = entry.data.clone();

        if let Some(next) = update(previous.as_deref()) {
            entry.data = Some(Arc::new(next));
            entry.version += 1;
            self.inner.emit(CacheEvent::Updated(key.to_string()));
        }

        previous
    }

    pub async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let entries = self.inner.entries.lock().await;
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Forget `key`. A fetch still running for it is aborted and its
    /// waiters get [`ErrorKind::Cancelled`](babbly_core::ErrorKind::Cancelled).
    pub async fn invalidate(&self, key: &str) {
        let removed = self.inner.entries.lock().await.remove(key).map(Entry::discard).is_some();
        if removed {
            self.inner.emit(CacheEvent::Invalidated(key.to_string()));
        }
    }

    pub async fn invalidate_prefix(&self, prefix: &str) {
        let removed: Vec<String> = {
            let mut entries = self.inner.entries.lock().await;
            let keys: Vec<String> = entries
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect();
            keys.into_iter()
                .filter(|k| entries.remove(k).map(Entry::discard).is_some())
                .collect()
        };
        for key in removed {
            self.inner.emit(CacheEvent::Invalidated(key));
        }
    }

    /// Drop everything and abort every running fetch, e.g. when the session
    /// ends.
    pub async fn clear(&self) {
        self.invalidate_prefix("").await;
    }

    /// Poll `key` every refresh interval until `cancel` fires. Returns
    /// `None` when polling is disabled.
    pub fn spawn_polling(
        &self,
        key: String,
        fetcher: Fetcher<V>,
        cancel: CancellationToken,
    ) -> Option<JoinHandle<()>> {
        let interval = self.inner.config.refresh_interval?;
        let cache = self.clone();

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; the view already has data.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = cache.fetch_fresh(&key, fetcher.clone(), &cancel).await {
                            tracing::debug!(key = %key, error = %e, "Polling refresh failed");
                        }
                    }
                }
            }
            tracing::debug!(key = %key, "Polling stopped");
        }))
    }

    fn fresh(&self, entry: &Entry<V>) -> Option<Arc<V>> {
        let fetched_at = entry.fetched_at?;
        if entry.inflight.is_some() || fetched_at.elapsed() >= self.inner.config.dedup_interval {
            return None;
        }
        entry.data.clone()
    }

    /// Join the in-flight fetch for `key` or start one. Must be called with
    /// the entries lock held so two callers cannot both start.
    ///
    /// A fetch started before the latest local write is not joined: its
    /// result would be discarded, so a new one replaces it.
    fn start_locked(
        &self,
        entries: &mut HashMap<String, Entry<V>>,
        key: &str,
        fetcher: Fetcher<V>,
    ) -> SharedFetch<V> {
        let entry = entries.entry(key.to_string()).or_default();
        entry.fetcher = Some(fetcher.clone());

        if let Some(inflight) = &entry.inflight {
            if inflight.version == entry.version {
                tracing::trace!(key, "Attaching to in-flight fetch");
                return inflight.fetch.clone();
            }
            tracing::debug!(key, fetch_id = inflight.id, "Superseding fetch older than local write");
        }

        let inner = self.inner.clone();
        let owned_key = key.to_string();
        let version = entry.version;
        let id = inner.next_fetch.fetch_add(1, Ordering::Relaxed);
        let cancel = inner.shutdown.child_token();
        let aborted = cancel.clone();

        let pending = async move {
            let result = tokio::select! {
                result = fetch_with_retry(&inner.config, &fetcher, &owned_key) => result,
                _ = aborted.cancelled() => Err(ApiError::cancelled()),
            };
            inner.complete(&owned_key, id, version, result).await
        }
        .boxed()
        .shared();

        entry.inflight = Some(InFlight {
            id,
            version,
            cancel,
            fetch: pending.clone(),
        });
        // Drive the fetch to completion even if every waiter goes away.
        tokio::spawn(pending.clone());

        pending
    }
}

async fn wait<V>(pending: SharedFetch<V>, cancel: &CancellationToken) -> ApiResult<Arc<V>> {
    tokio::select! {
        result = pending => result,
        _ = cancel.cancelled() => Err(ApiError::cancelled()),
    }
}

async fn fetch_with_retry<V>(config: &CacheConfig, fetcher: &Fetcher<V>, key: &str) -> ApiResult<V> {
    let mut attempt: u32 = 0;
    loop {
        match fetcher().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.error_retry_count => {
                let delay = config
                    .error_retry_interval
                    .saturating_mul(2u32.saturating_pow(attempt));
                attempt += 1;
                tracing::warn!(
                    key,
                    attempt,
                    max_attempts = config.error_retry_count,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Fetch failed, will retry"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use babbly_core::ErrorKind;

    fn config() -> CacheConfig {
        CacheConfig {
            dedup_interval: Duration::from_secs(2),
            error_retry_count: 3,
            error_retry_interval: Duration::from_millis(100),
            focus_throttle: Duration::from_secs(3),
            refresh_interval: Some(Duration::from_secs(5)),
        }
    }

    fn cache() -> SwrCache<u32> {
        SwrCache::new(config(), CancellationToken::new())
    }

    /// Fetcher that counts calls, takes 50ms and returns the call number.
    fn counting() -> (Fetcher<u32>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let f = fetcher(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(n as u32)
            }
        });
        (f, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_fetches_share_one_request() {
        let cache = cache();
        let (f, calls) = counting();
        let cancel = CancellationToken::new();

        let (a, b) = tokio::join!(
            cache.fetch("/api/posts?page=1&pageSize=10", f.clone(), &cancel),
            cache.fetch("/api/posts?page=1&pageSize=10", f.clone(), &cancel),
        );

        assert_eq!(*a.unwrap(), 1);
        assert_eq!(*b.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dedup_window() {
        let cache = cache();
        let (f, calls) = counting();
        let cancel = CancellationToken::new();

        cache.fetch("k", f.clone(), &cancel).await.unwrap();
        let again = cache.fetch("k", f.clone(), &cancel).await.unwrap();
        assert_eq!(*again, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(3)).await;
        let later = cache.fetch("k", f.clone(), &cancel).await.unwrap();
        assert_eq!(*later, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_while_revalidate() {
        let cache = cache();
        let (f, calls) = counting();
        let cancel = CancellationToken::new();

        cache.fetch("k", f.clone(), &cancel).await.unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;

        let mut events = cache.subscribe();
        let snapshot = cache.peek_and_revalidate("k", f.clone()).await;
        assert_eq!(snapshot.data.as_deref(), Some(&1));
        assert!(snapshot.is_validating);

        assert_eq!(events.recv().await.unwrap(), CacheEvent::Updated("k".to_string()));
        assert_eq!(cache.get("k").await.as_deref(), Some(&2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_retryable_errors() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let f = fetcher(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ApiError::from_status(503, None))
                } else {
                    Ok(7)
                }
            }
        });

        let value = cache.fetch("k", f, &CancellationToken::new()).await.unwrap();
        assert_eq!(*value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_retry_client_errors() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let f = fetcher(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<u32, _>(ApiError::from_status(404, None)) }
        });

        let err = cache.fetch("k", f, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.snapshot("k").await.error, Some(err));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_waiter_detaches() {
        let cache = cache();
        let (f, _) = counting();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = cache.fetch("k", f, &cancel).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);

        // The request itself still completes and fills the cache.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_fetches() {
        let shutdown = CancellationToken::new();
        let cache: SwrCache<u32> = SwrCache::new(config(), shutdown.clone());
        let (f, _) = counting();

        let pending = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.fetch("k", f, &CancellationToken::new()).await })
        };
        tokio::task::yield_now().await;
        shutdown.cancel();

        let err = pending.await.unwrap().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_write_wins_over_older_fetch() {
        let cache = cache();
        let (f, _) = counting();
        let cancel = CancellationToken::new();

        let pending = {
            let cache = cache.clone();
            let f = f.clone();
            tokio::spawn(async move { cache.fetch_fresh("k", f, &CancellationToken::new()).await })
        };
        tokio::task::yield_now().await;

        let previous = cache.mutate("k", |_| Some(99)).await;
        assert!(previous.is_none());

        assert_eq!(*pending.await.unwrap().unwrap(), 1);
        assert_eq!(cache.get("k").await.as_deref(), Some(&99));

        // A fetch started after the write is applied normally.
        let fresh = cache.fetch_fresh("k", f, &cancel).await.unwrap();
        assert_eq!(*fresh, 2);
        assert_eq!(cache.get("k").await.as_deref(), Some(&2));
    }

    fn spawn_fetch(cache: &SwrCache<u32>, f: &Fetcher<u32>) -> JoinHandle<ApiResult<Arc<u32>>> {
        let (cache, f) = (cache.clone(), f.clone());
        tokio::spawn(async move { cache.fetch_fresh("k", f, &CancellationToken::new()).await })
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidated_fetch_cannot_fill_new_entry() {
        let cache = cache();
        let (f, calls) = counting();

        let first = spawn_fetch(&cache, &f);
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.invalidate("k").await;

        let second = spawn_fetch(&cache, &f);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(first.await.unwrap().unwrap_err().kind, ErrorKind::Cancelled);
        // The new entry keeps its own request.
        let snapshot = cache.snapshot("k").await;
        assert!(snapshot.data.is_none());
        assert!(snapshot.is_validating);

        assert_eq!(*second.await.unwrap().unwrap(), 2);
        assert_eq!(cache.get("k").await.as_deref(), Some(&2));
        assert!(!cache.snapshot("k").await.is_validating);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revalidate_after_write_replaces_older_fetch() {
        let cache = cache();
        let (f, calls) = counting();

        let older = spawn_fetch(&cache, &f);
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.mutate("k", |_| Some(99)).await;
        assert!(cache.revalidate("k").await);

        // The older request finishes first and is not written.
        assert_eq!(*older.await.unwrap().unwrap(), 1);
        let snapshot = cache.snapshot("k").await;
        assert_eq!(snapshot.data.as_deref(), Some(&99));
        assert!(snapshot.is_validating);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some(&2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_aborts_running_fetches() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let finished = calls.clone();
        let f = fetcher(move || {
            let finished = finished.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            }
        });

        let pending = spawn_fetch(&cache, &f);
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.clear().await;

        assert_eq!(pending.await.unwrap().unwrap_err().kind, ErrorKind::Cancelled);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_prefix() {
        let cache = cache();
        cache.mutate("/api/posts?page=1", |_| Some(1)).await;
        cache.mutate("/api/posts?page=2", |_| Some(2)).await;
        cache.mutate("/api/comments/post/1", |_| Some(3)).await;

        cache.invalidate_prefix("/api/posts").await;
        assert!(cache.keys_with_prefix("/api/posts").await.is_empty());
        assert_eq!(cache.get("/api/comments/post/1").await.as_deref(), Some(&3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_revalidation_is_throttled() {
        let cache = cache();
        let (f, calls) = counting();
        let cancel = CancellationToken::new();
        cache.fetch("k", f.clone(), &cancel).await.unwrap();

        assert!(cache.revalidate_on_focus("k").await);
        assert!(!cache.revalidate_on_focus("k").await);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(cache.revalidate_on_focus("k").await);
        assert!(!cache.revalidate_on_focus("unknown").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_refreshes_until_cancelled() {
        let cache = cache();
        let (f, calls) = counting();
        let cancel = CancellationToken::new();
        cache.fetch("k", f.clone(), &cancel).await.unwrap();

        let handle = cache
            .spawn_polling("k".to_string(), f, cancel.clone())
            .unwrap();
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        cancel.cancel();
        handle.await.unwrap();
    }
}
