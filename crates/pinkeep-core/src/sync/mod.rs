//! Cache freshness and full-refresh orchestration.
//!
//! `SyncCoordinator::get_all_posts` answers a query from the local cache and,
//! when the remote reports changes, follows up with a refreshed answer once the
//! first remote page has replaced the cache. Remaining pages are fetched by a
//! background task paced by the [`RateLimiter`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::{FutureExt, Stream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::api::{PostsApi, RateLimiter};
use crate::config::{ClientConfig, DEFAULT_API_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::connectivity::ConnectivityProvider;
use crate::error::{Error, Result};
use crate::models::{parse_tags, Post, PostListResult, PostQuery};
use crate::services::{LocalStore, PreferenceStore, WriteFence, WriteTicket};
use crate::util::{contains_html_chars, now_as_tz_format};

/// Results of one `get_all_posts` call: a local answer, optionally followed by
/// a refreshed one.
///
/// The refresh runs only when the second item is pulled.
pub struct PostListUpdates {
    first: Option<Result<PostListResult>>,
    refresh: Option<BoxFuture<'static, Result<PostListResult>>>,
}

impl PostListUpdates {
    fn single(result: Result<PostListResult>) -> Self {
        Self {
            first: Some(result),
            refresh: None,
        }
    }

    fn with_refresh(
        snapshot: Result<PostListResult>,
        refresh: BoxFuture<'static, Result<PostListResult>>,
    ) -> Self {
        Self {
            first: Some(snapshot),
            refresh: Some(refresh),
        }
    }

    /// Next result, or `None` once the sequence is exhausted.
    pub async fn next(&mut self) -> Option<Result<PostListResult>> {
        if let Some(first) = self.first.take() {
            return Some(first);
        }
        let refresh = self.refresh.take()?;
        Some(refresh.await)
    }

    /// Whether a refreshed result will follow the local one.
    pub const fn has_refresh(&self) -> bool {
        self.refresh.is_some()
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<PostListResult>> + Send {
        futures::stream::unfold(self, |mut updates| async move {
            updates.next().await.map(|item| (item, updates))
        })
    }

    /// Drive the sequence to completion and return the last result.
    pub async fn last(mut self) -> Option<Result<PostListResult>> {
        let mut last = None;
        while let Some(item) = self.next().await {
            last = Some(item);
        }
        last
    }
}

impl fmt::Debug for PostListUpdates {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PostListUpdates")
            .field("first", &self.first)
            .field("has_refresh", &self.has_refresh())
            .finish()
    }
}

/// Decides cache freshness and drives full refreshes.
#[derive(Clone)]
pub struct SyncCoordinator {
    api: Arc<dyn PostsApi>,
    store: LocalStore,
    connectivity: Arc<dyn ConnectivityProvider>,
    rate_limiter: RateLimiter,
    page_size: usize,
    server_down_timeout: Duration,
    fence: WriteFence,
    page_fill: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SyncCoordinator {
    pub fn new(
        api: Arc<dyn PostsApi>,
        store: LocalStore,
        connectivity: Arc<dyn ConnectivityProvider>,
    ) -> Self {
        Self {
            api,
            store,
            connectivity,
            rate_limiter: RateLimiter::default(),
            page_size: DEFAULT_API_PAGE_SIZE,
            server_down_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            fence: WriteFence::new(),
            page_fill: Arc::new(Mutex::new(None)),
        }
    }

    /// Coordinator using the page size, pacing and timeout from `config`.
    pub fn from_config(
        api: Arc<dyn PostsApi>,
        store: LocalStore,
        connectivity: Arc<dyn ConnectivityProvider>,
        config: &ClientConfig,
    ) -> Self {
        Self::new(api, store, connectivity)
            .with_page_size(config.page_size)
            .with_rate_limiter(RateLimiter::new(config.rate_limit_interval()))
            .with_server_down_timeout(config.request_timeout())
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    #[must_use]
    pub const fn with_server_down_timeout(mut self, timeout: Duration) -> Self {
        self.server_down_timeout = timeout;
        self
    }

    pub const fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn api(&self) -> &Arc<dyn PostsApi> {
        &self.api
    }

    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Remote update time, bounded by the server-down timeout.
    pub async fn update(&self) -> Result<String> {
        tokio::time::timeout(self.server_down_timeout, self.api.fetch_update_time())
            .await
            .map_err(|_| Error::Timeout)?
    }

    /// Answer `query` from the cache, refreshing it first if the remote changed.
    pub async fn get_all_posts(&self, query: PostQuery) -> PostListUpdates {
        if !self.connectivity.is_connected().await {
            tracing::debug!("Offline, answering from local cache");
            return PostListUpdates::single(self.store.local_result(&query, true).await);
        }

        let user_last_update = match self.store.last_update().await {
            Ok(value) => value,
            Err(error) => return PostListUpdates::single(Err(error)),
        };
        let api_last_update = match self.update().await {
            Ok(value) => value,
            Err(error) => {
                tracing::debug!(%error, "Update time unavailable, assuming remote changed");
                now_as_tz_format()
            }
        };

        if !user_last_update.trim().is_empty() && user_last_update == api_last_update {
            tracing::debug!(last_update = %api_last_update, "Local cache is up to date");
            return PostListUpdates::single(self.store.local_result(&query, true).await);
        }

        tracing::debug!(
            local = %user_last_update,
            remote = %api_last_update,
            "Local cache is stale"
        );
        let snapshot = self.store.local_result(&query, false).await;
        let coordinator = self.clone();
        let refresh =
            async move { coordinator.refresh(&query, api_last_update).await }.boxed();
        PostListUpdates::with_refresh(snapshot, refresh)
    }

    /// Replace the cache with the first remote page and start filling the rest.
    async fn refresh(&self, query: &PostQuery, api_last_update: String) -> Result<PostListResult> {
        let ticket = self.fence.advance();
        self.cancel_page_fill().await;

        let posts = self.api.fetch_page(0, self.page_size).await?;
        let fetched = posts.len();

        let committed = self
            .store
            .replace_all_fenced(ticket.clone(), sanitize_posts(posts), api_last_update)
            .await?;

        if committed {
            tracing::info!(posts = fetched, "Replaced local cache with first remote page");
            if fetched == self.page_size {
                self.spawn_page_fill(ticket).await;
            }
        } else {
            tracing::debug!("Refresh superseded before commit");
        }

        self.store.local_result(query, committed).await
    }

    /// Abort the running page fill, if any, and wait for it to stop.
    async fn cancel_page_fill(&self) {
        let handle = self.page_fill.lock().await.take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
            tracing::debug!("Cancelled running page fill");
        }
    }

    async fn spawn_page_fill(&self, ticket: WriteTicket) {
        let mut slot = self.page_fill.lock().await;
        if !ticket.is_current() {
            return;
        }

        let api = Arc::clone(&self.api);
        let store = self.store.clone();
        let rate_limiter = self.rate_limiter.clone();
        let page_size = self.page_size;

        let handle = tokio::spawn(async move {
            match fill_remaining_pages(api, store, rate_limiter, page_size, ticket).await {
                Ok(saved) => tracing::info!(posts = saved, "Background page fill finished"),
                Err(error) => {
                    tracing::warn!(%error, "Background page fill failed; next full sync resumes it");
                }
            }
        });

        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Wait for the current background page fill to finish.
    pub async fn wait_for_page_fill(&self) {
        let handle = self.page_fill.lock().await.take();
        if let Some(handle) = handle {
            if let Err(error) = handle.await {
                if !error.is_cancelled() {
                    tracing::warn!(%error, "Background page fill panicked");
                }
            }
        }
    }
}

async fn fill_remaining_pages(
    api: Arc<dyn PostsApi>,
    store: LocalStore,
    rate_limiter: RateLimiter,
    page_size: usize,
    ticket: WriteTicket,
) -> Result<usize> {
    let mut offset = page_size;
    let mut saved = 0;

    while ticket.is_current() {
        let posts = rate_limiter
            .run(|| api.fetch_page(offset, page_size))
            .await?;
        let fetched = posts.len();

        if fetched > 0 && !store.append_fenced(ticket.clone(), sanitize_posts(posts)).await? {
            break;
        }
        saved += fetched;
        tracing::debug!(offset, fetched, "Saved additional page");

        if fetched < page_size {
            break;
        }
        offset += fetched;
    }

    Ok(saved)
}

/// Decode HTML entities left in tag names before they reach the cache.
pub fn sanitize_posts(posts: Vec<Post>) -> Vec<Post> {
    posts
        .into_iter()
        .map(|mut post| {
            if post.tags.iter().any(|tag| contains_html_chars(tag)) {
                post.tags = parse_tags(&post.tags_string());
            }
            post
        })
        .collect()
}
