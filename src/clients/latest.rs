//! Last-request-wins guard for metadata fetches.

use futures::future::{AbortHandle, Abortable};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use super::{CatalogSource, MetadataError};
use crate::models::CatalogPage;

/// Only the most recently started call is honoured.
///
/// Starting a call aborts the one in flight. A call whose generation is no
/// longer the newest when it resolves reports [`MetadataError::Superseded`]
/// instead of its result.
#[derive(Default)]
pub struct LatestRequest {
    generation: AtomicU64,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl LatestRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run<F, T>(&self, request: F) -> Result<T, MetadataError>
    where
        F: Future<Output = Result<T, MetadataError>>,
    {
        self.run_numbered(request).await.1
    }

    /// Like [`LatestRequest::run`], also returning the generation the call ran as.
    pub async fn run_numbered<F, T>(&self, request: F) -> (u64, Result<T, MetadataError>)
    where
        F: Future<Output = Result<T, MetadataError>>,
    {
        let (handle, registration) = AbortHandle::new_pair();

        let generation = {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = in_flight.replace(handle) {
                previous.abort();
            }
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let outcome = Abortable::new(request, registration).await;

        if !self.is_current(generation) {
            debug!(generation, "Discarding superseded metadata response");
            return (generation, Err(MetadataError::Superseded));
        }

        let result = match outcome {
            Ok(result) => result,
            Err(_aborted) => Err(MetadataError::Superseded),
        };
        (generation, result)
    }

    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Generation of the newest call started so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// A catalog source paired with a [`LatestRequest`], keeping the last honoured page.
pub struct CatalogFeed<C: CatalogSource> {
    source: Arc<C>,
    latest: LatestRequest,
    current: Mutex<Option<CatalogPage>>,
}

impl<C: CatalogSource> CatalogFeed<C> {
    #[must_use]
    pub fn new(source: Arc<C>) -> Self {
        Self {
            source,
            latest: LatestRequest::new(),
            current: Mutex::new(None),
        }
    }

    pub async fn fetch(&self, query: C::Query) -> Result<CatalogPage, MetadataError> {
        let (generation, outcome) = self.latest.run_numbered(self.source.fetch_page(query)).await;
        self.publish(generation, outcome?)
    }

    /// Stores `page` unless a newer fetch started since `generation` began.
    fn publish(&self, generation: u64, page: CatalogPage) -> Result<CatalogPage, MetadataError> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.latest.is_current(generation) {
            debug!(generation, "Newer fetch started, not publishing page");
            return Err(MetadataError::Superseded);
        }
        *current = Some(page.clone());
        Ok(page)
    }

    /// Last page delivered by [`CatalogFeed::fetch`].
    #[must_use]
    pub fn current(&self) -> Option<CatalogPage> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Feeds kept per client-chosen key, so each browser tab or view gets its own
/// last-request-wins ordering.
pub struct FeedRegistry<C: CatalogSource> {
    source: Arc<C>,
    feeds: Mutex<HashMap<String, Arc<CatalogFeed<C>>>>,
    capacity: usize,
}

impl<C: CatalogSource> FeedRegistry<C> {
    #[must_use]
    pub fn new(source: Arc<C>, capacity: usize) -> Self {
        Self {
            source,
            feeds: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    #[must_use]
    pub const fn source(&self) -> &Arc<C> {
        &self.source
    }

    /// Shared feed for `key`; without a key every call gets a fresh one.
    pub fn feed(&self, key: Option<&str>) -> Arc<CatalogFeed<C>> {
        let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) else {
            return Arc::new(CatalogFeed::new(self.source.clone()));
        };

        let mut feeds = self.feeds.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(feed) = feeds.get(key) {
            return feed.clone();
        }
        if feeds.len() >= self.capacity {
            debug!(capacity = self.capacity, "Feed registry full, dropping idle feeds");
            feeds.retain(|_, feed| Arc::strong_count(feed) > 1);
        }
        let feed = Arc::new(CatalogFeed::new(self.source.clone()));
        feeds.insert(key.to_string(), feed.clone());
        feed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.feeds.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExternalId, VolumeId};
    use crate::models::CatalogItem;
    use std::time::Duration;

    struct SlowSource;

    #[async_trait::async_trait]
    impl CatalogSource for SlowSource {
        type Query = (&'static str, u64);

        async fn fetch_page(&self, (title, delay_ms): Self::Query) -> Result<CatalogPage, MetadataError> {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok(CatalogPage {
                items: vec![CatalogItem {
                    id: ExternalId::Book(VolumeId::new(title)),
                    title: title.to_string(),
                    subtitle: None,
                    image_url: None,
                    description: None,
                    rating: None,
                    rating_count: None,
                }],
                page: 1,
                total_pages: 1,
                total_items: 1,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_fetch_supersedes_older() {
        let feed = Arc::new(CatalogFeed::new(Arc::new(SlowSource)));

        let first = {
            let feed = feed.clone();
            tokio::spawn(async move { feed.fetch(("A", 300)).await })
        };
        tokio::task::yield_now().await;

        let second = feed.fetch(("B", 50)).await.unwrap();
        assert_eq!(second.items[0].title, "B");

        let first = first.await.unwrap();
        assert_eq!(first, Err(MetadataError::Superseded));

        assert_eq!(feed.current().unwrap().items[0].title, "B");
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_from_older_generation_is_not_published() {
        let feed = CatalogFeed::new(Arc::new(SlowSource));
        let newest = feed.fetch(("B", 10)).await.unwrap();
        let stale = SlowSource.fetch_page(("A", 0)).await.unwrap();

        assert_eq!(feed.publish(0, stale), Err(MetadataError::Superseded));
        assert_eq!(feed.current(), Some(newest));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_result_is_discarded_even_when_it_completes() {
        let latest = Arc::new(LatestRequest::new());
        let (release_a, wait_a) = tokio::sync::oneshot::channel::<()>();

        let first = {
            let latest = latest.clone();
            tokio::spawn(async move {
                latest
                    .run(async {
                        wait_a.await.ok();
                        Ok::<_, MetadataError>("A")
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;

        let second = latest.run(async { Ok::<_, MetadataError>("B") }).await;
        release_a.send(()).ok();

        assert_eq!(second, Ok("B"));
        assert_eq!(first.await.unwrap(), Err(MetadataError::Superseded));
        assert_eq!(latest.generation(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_shares_feed_per_key() {
        let registry = FeedRegistry::new(Arc::new(SlowSource), 2);

        let tab = registry.feed(Some("tab-1"));
        assert!(Arc::ptr_eq(&tab, &registry.feed(Some(" tab-1 "))));
        assert!(!Arc::ptr_eq(&tab, &registry.feed(None)));
        assert_eq!(registry.len(), 1);

        tab.fetch(("A", 10)).await.unwrap();
        assert_eq!(registry.feed(Some("tab-1")).current().unwrap().items[0].title, "A");

        registry.feed(Some("tab-2"));
        drop(tab);
        registry.feed(Some("tab-3"));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_single_request_passes_errors_through() {
        let latest = LatestRequest::new();
        let result: Result<(), _> = latest
            .run(async { Err(MetadataError::Http { status: 500, message: "boom".into() }) })
            .await;

        assert!(matches!(result, Err(MetadataError::Http { status: 500, .. })));
    }
}
