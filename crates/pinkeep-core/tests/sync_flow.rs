//! End-to-end behaviour of the posts data layer against a scripted remote.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use pinkeep_core::api::{AddBookmarkRequest, ApiResultCode, PostsApi, RateLimiter};
use pinkeep_core::connectivity::StaticConnectivity;
use pinkeep_core::models::{SuggestedTags, Tag};
use pinkeep_core::services::PreferenceStore;
use pinkeep_core::{
    AddPost, Error, ErrorKind, LocalStore, Post, PostQuery, PostsRepository, Result,
    SyncCoordinator,
};
use pretty_assertions::assert_eq;

const REMOTE_UPDATE: &str = "2024-06-01T10:00:00Z";

struct FakeApi {
    update_time: Mutex<Option<String>>,
    posts: Mutex<Vec<Post>>,
    delete_code: Mutex<ApiResultCode>,
    add_code: Mutex<ApiResultCode>,
    fail_pages: Mutex<bool>,
    fail_from_offset: Mutex<Option<usize>>,
    slow_additional_pages: Option<Duration>,
    update_calls: AtomicUsize,
    page_calls: Mutex<Vec<usize>>,
}

impl FakeApi {
    fn with_posts(count: usize) -> Self {
        let posts = (0..count)
            .map(|index| {
                let mut post = Post::new(
                    format!("https://example.com/{index:03}"),
                    format!("Post {index}"),
                );
                post.time = format!("2024-01-01T00:{:02}:{:02}Z", index / 60, index % 60);
                post.tags = vec!["shared".to_string()];
                post
            })
            .collect();

        Self {
            update_time: Mutex::new(Some(REMOTE_UPDATE.to_string())),
            posts: Mutex::new(posts),
            delete_code: Mutex::new(ApiResultCode::Done),
            add_code: Mutex::new(ApiResultCode::Done),
            fail_pages: Mutex::new(false),
            fail_from_offset: Mutex::new(None),
            slow_additional_pages: None,
            update_calls: AtomicUsize::new(0),
            page_calls: Mutex::new(Vec::new()),
        }
    }

    fn slowed(mut self, delay: Duration) -> Self {
        self.slow_additional_pages = Some(delay);
        self
    }

    fn set_remote(&self, posts: Vec<Post>, update_time: &str) {
        *self.posts.lock().unwrap() = posts;
        *self.update_time.lock().unwrap() = Some(update_time.to_string());
    }

    fn page_calls(&self) -> Vec<usize> {
        self.page_calls.lock().unwrap().clone()
    }

    fn remote_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst) + self.page_calls().len()
    }
}

#[async_trait]
impl PostsApi for FakeApi {
    async fn fetch_update_time(&self) -> Result<String> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.update_time
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::Transport("connection refused".to_string()))
    }

    async fn add_bookmark(&self, request: &AddBookmarkRequest) -> Result<ApiResultCode> {
        let code = self.add_code.lock().unwrap().clone();
        if code.is_done() {
            let mut post = Post::new(request.url.clone(), request.title.clone());
            post.private = request.private;
            post.read_later = request.read_later;
            post.tags = request
                .tags
                .as_deref()
                .map(pinkeep_core::models::split_tags)
                .unwrap_or_default();
            self.posts.lock().unwrap().insert(0, post);
        }
        Ok(code)
    }

    async fn delete_bookmark(&self, _url: &str) -> Result<ApiResultCode> {
        Ok(self.delete_code.lock().unwrap().clone())
    }

    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<Post>> {
        self.page_calls.lock().unwrap().push(offset);
        if *self.fail_pages.lock().unwrap() {
            return Err(Error::Timeout);
        }
        if self
            .fail_from_offset
            .lock()
            .unwrap()
            .is_some_and(|first_failing| offset >= first_failing)
        {
            return Err(Error::Timeout);
        }
        if offset > 0 {
            if let Some(delay) = self.slow_additional_pages {
                tokio::time::sleep(delay).await;
            }
        }
        let posts = self.posts.lock().unwrap();
        Ok(posts.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn fetch_bookmark(&self, url: &str) -> Result<Vec<Post>> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|post| post.url == url)
            .cloned()
            .collect())
    }

    async fn fetch_suggested_tags(&self, _url: &str) -> Result<SuggestedTags> {
        Ok(SuggestedTags::default())
    }

    async fn fetch_all_tags(&self) -> Result<Vec<Tag>> {
        Ok(Vec::new())
    }
}

fn repository(
    api: &Arc<FakeApi>,
    connectivity: StaticConnectivity,
    page_size: usize,
) -> PostsRepository {
    let sync = SyncCoordinator::new(
        Arc::clone(api) as Arc<dyn PostsApi>,
        LocalStore::open_in_memory().unwrap(),
        Arc::new(connectivity),
    )
    .with_page_size(page_size)
    .with_rate_limiter(RateLimiter::new(Duration::ZERO));
    PostsRepository::new(sync)
}

async fn cached_count(repo: &PostsRepository) -> usize {
    repo.sync().store().count(&PostQuery::all()).await.unwrap()
}

#[tokio::test]
async fn offline_answers_locally_without_remote_calls() {
    let api = Arc::new(FakeApi::with_posts(5));
    let repo = repository(&api, StaticConnectivity::offline(), 100);

    let results: Vec<_> = repo
        .get_all_posts(PostQuery::all())
        .await
        .into_stream()
        .collect()
        .await;

    assert_eq!(results.len(), 1);
    let only = results.into_iter().next().unwrap().unwrap();
    assert!(only.up_to_date);
    assert_eq!(only.total_count, 0);
    assert_eq!(api.remote_calls(), 0);
}

#[tokio::test]
async fn stale_cache_yields_snapshot_then_refreshed_page() {
    let api = Arc::new(FakeApi::with_posts(7));
    let repo = repository(&api, StaticConnectivity::online(), 3);

    let mut updates = repo.get_all_posts(PostQuery::all().with_page(3, 0)).await;

    let snapshot = updates.next().await.unwrap().unwrap();
    assert_eq!(snapshot.total_count, 0);
    assert!(snapshot.posts.is_empty());
    assert!(!snapshot.up_to_date);

    let refreshed = updates.next().await.unwrap().unwrap();
    assert!(refreshed.up_to_date);
    assert!(refreshed.total_count >= 3);
    assert_eq!(refreshed.posts.len(), 3);
    assert!(updates.next().await.is_none());

    repo.wait_for_page_fill().await;

    assert_eq!(cached_count(&repo).await, 7);
    assert_eq!(api.page_calls(), vec![0, 3, 6]);
    assert_eq!(
        repo.sync().store().last_update().await.unwrap(),
        REMOTE_UPDATE
    );
}

#[tokio::test]
async fn matching_update_time_never_fetches_pages() {
    let api = Arc::new(FakeApi::with_posts(2));
    let repo = repository(&api, StaticConnectivity::online(), 100);
    repo.get_all_posts(PostQuery::all()).await.last().await;
    repo.wait_for_page_fill().await;
    let pages_after_first_sync = api.page_calls().len();

    let mut updates = repo.get_all_posts(PostQuery::all()).await;
    assert!(!updates.has_refresh());
    let result = updates.next().await.unwrap().unwrap();

    assert!(result.up_to_date);
    assert_eq!(result.total_count, 2);
    assert!(updates.next().await.is_none());
    assert_eq!(api.page_calls().len(), pages_after_first_sync);
}

#[tokio::test]
async fn blank_last_update_is_always_stale() {
    let api = Arc::new(FakeApi::with_posts(1));
    *api.update_time.lock().unwrap() = Some(String::new());
    let repo = repository(&api, StaticConnectivity::online(), 100);

    let updates = repo.get_all_posts(PostQuery::all()).await;

    assert!(updates.has_refresh());
}

#[tokio::test]
async fn escaped_tags_are_stored_unescaped() {
    let api = Arc::new(FakeApi::with_posts(0));
    let mut post = Post::new("https://example.com/pets", "Pets");
    post.tags = vec!["cats&amp;dogs".to_string()];
    api.set_remote(vec![post], REMOTE_UPDATE);
    let repo = repository(&api, StaticConnectivity::online(), 100);

    repo.get_all_posts(PostQuery::all()).await.last().await;

    let cached = repo
        .sync()
        .store()
        .get("https://example.com/pets")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.tags, vec!["cats&dogs"]);
    assert_eq!(
        repo.search_existing_post_tag("cats").await.unwrap(),
        vec!["cats&dogs"]
    );
}

#[tokio::test]
async fn failed_first_page_reports_transport_error_after_snapshot() {
    let api = Arc::new(FakeApi::with_posts(3));
    *api.fail_pages.lock().unwrap() = true;
    let repo = repository(&api, StaticConnectivity::online(), 100);

    let mut updates = repo.get_all_posts(PostQuery::all()).await;

    assert!(updates.next().await.unwrap().is_ok());
    let error = updates.next().await.unwrap().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Transport);
    assert_eq!(repo.sync().store().last_update().await.unwrap(), "");
}

#[tokio::test]
async fn new_refresh_cancels_running_page_fill() {
    let api = Arc::new(FakeApi::with_posts(6).slowed(Duration::from_millis(300)));
    let repo = repository(&api, StaticConnectivity::online(), 2);

    repo.get_all_posts(PostQuery::all()).await.last().await;
    assert_eq!(cached_count(&repo).await, 2);

    let replacement = Post::new("https://example.com/only", "Only");
    api.set_remote(vec![replacement], "2024-06-02T00:00:00Z");

    let last = repo
        .get_all_posts(PostQuery::all())
        .await
        .last()
        .await
        .unwrap()
        .unwrap();
    repo.wait_for_page_fill().await;
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(last.total_count, 1);
    assert_eq!(cached_count(&repo).await, 1);
    assert!(repo
        .sync()
        .store()
        .get("https://example.com/only")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn add_existing_item_returns_stored_post() {
    let api = Arc::new(FakeApi::with_posts(1));
    *api.add_code.lock().unwrap() = ApiResultCode::ItemAlreadyExists;
    let repo = repository(&api, StaticConnectivity::online(), 100);

    let post = repo
        .add(AddPost::new("https://example.com/000", "Different title").replace(false))
        .await
        .unwrap();

    assert_eq!(post.title, "Post 0");
}

#[tokio::test]
async fn add_done_caches_the_remote_copy() {
    let api = Arc::new(FakeApi::with_posts(0));
    let repo = repository(&api, StaticConnectivity::online(), 100);

    let post = repo
        .add(
            AddPost::new("https://example.com/new", "New")
                .with_tags(["rust", "async"])
                .private(true),
        )
        .await
        .unwrap();

    assert!(post.private);
    assert_eq!(post.tags, vec!["rust", "async"]);
    assert_eq!(
        repo.get_post("https://example.com/new").await.unwrap(),
        post
    );
    assert_eq!(
        repo.sync().store().last_update().await.unwrap(),
        REMOTE_UPDATE
    );
}

#[tokio::test]
async fn rejected_delete_keeps_local_row() {
    let api = Arc::new(FakeApi::with_posts(1));
    let repo = repository(&api, StaticConnectivity::online(), 100);
    repo.get_all_posts(PostQuery::all()).await.last().await;
    *api.delete_code.lock().unwrap() = ApiResultCode::ItemNotFound;

    let error = repo.delete("https://example.com/000").await.unwrap_err();

    assert!(matches!(error, Error::Api(ApiResultCode::ItemNotFound)));
    assert_eq!(cached_count(&repo).await, 1);
}

#[tokio::test]
async fn accepted_delete_removes_local_row() {
    let api = Arc::new(FakeApi::with_posts(2));
    let repo = repository(&api, StaticConnectivity::online(), 100);
    repo.get_all_posts(PostQuery::all()).await.last().await;

    repo.delete("https://example.com/000").await.unwrap();

    assert_eq!(cached_count(&repo).await, 1);
    assert!(repo
        .sync()
        .store()
        .get("https://example.com/000")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn clear_cache_then_offline_read_is_empty() {
    let api = Arc::new(FakeApi::with_posts(4));
    let connectivity = Arc::new(StaticConnectivity::online());
    let sync = SyncCoordinator::new(
        Arc::clone(&api) as Arc<dyn PostsApi>,
        LocalStore::open_in_memory().unwrap(),
        Arc::clone(&connectivity) as Arc<dyn pinkeep_core::connectivity::ConnectivityProvider>,
    );
    let repo = PostsRepository::new(sync);
    repo.get_all_posts(PostQuery::all()).await.last().await;
    assert_eq!(cached_count(&repo).await, 4);

    repo.clear_cache().await.unwrap();
    connectivity.set_connected(false);

    let result = repo
        .get_all_posts(PostQuery::all())
        .await
        .last()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.total_count, 0);
    assert!(result.up_to_date);
}

#[tokio::test]
async fn page_fill_failure_keeps_committed_pages() {
    let api = Arc::new(FakeApi::with_posts(7));
    *api.fail_from_offset.lock().unwrap() = Some(4);
    let repo = repository(&api, StaticConnectivity::online(), 2);

    let mut updates = repo.get_all_posts(PostQuery::all()).await;
    updates.next().await.unwrap().unwrap();

    let refreshed = updates.next().await.unwrap().unwrap();
    assert!(refreshed.up_to_date);
    assert!(refreshed.total_count >= 2);

    repo.wait_for_page_fill().await;

    assert_eq!(api.page_calls(), vec![0, 2, 4]);
    assert_eq!(cached_count(&repo).await, 4);
    assert_eq!(
        repo.sync().store().last_update().await.unwrap(),
        REMOTE_UPDATE
    );
}
