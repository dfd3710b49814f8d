//! Paginated list view over the SWR cache.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use babbly_core::ApiResult;
use babbly_core::domain::{Page, PageRequest};

use super::keys::{page_key, pages_prefix};
use crate::cache::{SwrCache, fetcher};

/// Loads one page of a list from the gateway.
pub type PageLoader<T> = Arc<dyn Fn(PageRequest) -> BoxFuture<'static, ApiResult<Page<T>>> + Send + Sync>;

pub fn page_loader<T, F, Fut>(f: F) -> PageLoader<T>
where
    F: Fn(PageRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResult<Page<T>>> + Send + 'static,
{
    Arc::new(move |req| f(req).boxed())
}

/// A feed or comment thread: pages 1..=n of one resource, flattened.
///
/// Pages live in the shared cache, so a mutation applied to the cache is
/// visible through every list over the same resource.
pub struct PagedList<T> {
    cache: SwrCache<Page<T>>,
    resource: String,
    page_size: u32,
    loader: PageLoader<T>,
    cancel: CancellationToken,
    loaded_pages: AtomicU32,
    has_more: AtomicBool,
    loading: AtomicBool,
}

impl<T> PagedList<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(
        cache: SwrCache<Page<T>>,
        resource: impl Into<String>,
        page_size: u32,
        loader: PageLoader<T>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            cache,
            resource: resource.into(),
            page_size: page_size.max(1),
            loader,
            cancel,
            loaded_pages: AtomicU32::new(0),
            has_more: AtomicBool::new(false),
            loading: AtomicBool::new(false),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn key(&self, page: u32) -> String {
        page_key(&self.resource, PageRequest::new(page, self.page_size))
    }

    /// Load (or reload from cache) the first page and reset to it.
    pub async fn load_first(&self) -> ApiResult<()> {
        let page = self.fetch(1, false).await?;
        self.loaded_pages.store(1, Ordering::Release);
        self.has_more
            .store(page.has_more(self.page_size), Ordering::Release);
        Ok(())
    }

    /// Append the next page. Ignored while a load is running or when the
    /// list is exhausted; returns whether a page was added.
    pub async fn load_more(&self) -> ApiResult<bool> {
        if self.loaded_pages() == 0 {
            self.load_first().await?;
            return Ok(true);
        }
        if !self.has_more() {
            tracing::trace!(resource = %self.resource, "No more pages");
            return Ok(false);
        }
        let Some(_guard) = LoadingGuard::acquire(&self.loading) else {
            tracing::trace!(resource = %self.resource, "Load already running");
            return Ok(false);
        };

        let next = self.loaded_pages() + 1;
        let page = self.fetch(next, false).await?;
        self.loaded_pages.store(next, Ordering::Release);
        self.has_more
            .store(page.has_more(self.page_size), Ordering::Release);

        tracing::debug!(resource = %self.resource, page = next, items = page.items.len(), "Loaded page");
        Ok(true)
    }

    /// Refetch every loaded page, e.g. after a mutation or pull-to-refresh.
    pub async fn refresh(&self) -> ApiResult<()> {
        let loaded = self.loaded_pages().max(1);
        let pages = join_all((1..=loaded).map(|n| self.fetch(n, true))).await;

        let mut last = None;
        for page in pages {
            last = Some(page?);
        }
        if let Some(last) = last {
            self.loaded_pages.store(loaded, Ordering::Release);
            self.has_more
                .store(last.has_more(self.page_size), Ordering::Release);
        }
        Ok(())
    }

    /// Refetch after the user returns to the view, throttled per page.
    pub async fn revalidate_on_focus(&self) -> usize {
        let mut started = 0;
        for n in 1..=self.loaded_pages() {
            if self.cache.revalidate_on_focus(&self.key(n)).await {
                started += 1;
            }
        }
        started
    }

    /// Items of every loaded page, in order.
    pub async fn items(&self) -> Vec<T> {
        let mut items = Vec::new();
        for n in 1..=self.loaded_pages() {
            if let Some(page) = self.cache.get(&self.key(n)).await {
                items.extend(page.items.iter().cloned());
            }
        }
        items
    }

    /// Total reported with the first page, if the gateway sends one.
    pub async fn total(&self) -> Option<u64> {
        self.cache.get(&self.key(1)).await.and_then(|p| p.total)
    }

    pub async fn is_empty(&self) -> bool {
        self.items().await.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.has_more.load(Ordering::Acquire)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn loaded_pages(&self) -> u32 {
        self.loaded_pages.load(Ordering::Acquire)
    }

    /// Keep the first page fresh at the configured refresh interval until
    /// the list's token is cancelled.
    pub fn start_polling(&self) -> Option<JoinHandle<()>> {
        let req = PageRequest::new(1, self.page_size);
        let loader = self.loader.clone();
        self.cache
            .spawn_polling(self.key(1), fetcher(move || loader(req)), self.cancel.child_token())
    }

    /// Forget every cached page of this resource.
    pub async fn invalidate(&self) {
        self.cache.invalidate_prefix(&pages_prefix(&self.resource)).await;
        self.loaded_pages.store(0, Ordering::Release);
        self.has_more.store(false, Ordering::Release);
    }

    async fn fetch(&self, n: u32, fresh: bool) -> ApiResult<Arc<Page<T>>> {
        let req = PageRequest::new(n, self.page_size);
        let key = page_key(&self.resource, req);
        let loader = self.loader.clone();
        let fetch_page = fetcher(move || loader(req));

        if fresh {
            self.cache.fetch_fresh(&key, fetch_page, &self.cancel).await
        } else {
            self.cache.fetch(&key, fetch_page, &self.cancel).await
        }
    }
}

struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
