//! Posts facade used by front ends.

use std::sync::Arc;

use crate::api::{AddBookmarkRequest, ApiResultCode, API_MAX_LENGTH, API_MAX_URI_LENGTH};
use crate::error::{Error, Result};
use crate::models::{Post, PostDefaults, PostQuery, SuggestedTags};
use crate::sync::{sanitize_posts, PostListUpdates, SyncCoordinator};
use crate::util::{take_chars, unescape_html};

use super::share::{extract_url, SharedPost, UrlPreview, UrlPreviewer};
use super::PreferenceStore;

/// Schemes a bookmark url may use.
const ACCEPTED_SCHEMES: [&str; 6] = ["http", "https", "javascript", "mailto", "ftp", "file"];

/// Length of a `yes`/`no` query literal.
const fn literal_len(value: bool) -> usize {
    if value {
        3
    } else {
        2
    }
}

/// A bookmark to create or update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddPost {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    /// `None` uses the saved default
    pub private: Option<bool>,
    /// `None` uses the saved default
    pub read_later: Option<bool>,
    pub tags: Vec<String>,
    /// Overwrite an existing bookmark for the same url
    pub replace: bool,
}

impl AddPost {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            replace: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn private(mut self, private: bool) -> Self {
        self.private = Some(private);
        self
    }

    #[must_use]
    pub const fn read_later(mut self, read_later: bool) -> Self {
        self.read_later = Some(read_later);
        self
    }

    #[must_use]
    pub const fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }
}

/// Check that `url` parses and uses an accepted scheme; returns it trimmed.
pub fn validate_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("url must not be empty".to_string()));
    }

    let parsed = url::Url::parse(trimmed)
        .map_err(|error| Error::InvalidInput(format!("invalid url '{trimmed}': {error}")))?;
    if !ACCEPTED_SCHEMES.contains(&parsed.scheme()) {
        return Err(Error::InvalidInput(format!(
            "unsupported url scheme '{}'",
            parsed.scheme()
        )));
    }

    Ok(trimmed.to_string())
}

/// Entry point for reading and writing bookmarks.
#[derive(Clone)]
pub struct PostsRepository {
    sync: SyncCoordinator,
    previewer: Option<Arc<dyn UrlPreviewer>>,
}

impl PostsRepository {
    pub const fn new(sync: SyncCoordinator) -> Self {
        Self {
            sync,
            previewer: None,
        }
    }

    /// Resolve page titles for [`Self::save_shared`] with `previewer`.
    #[must_use]
    pub fn with_url_previewer(mut self, previewer: Arc<dyn UrlPreviewer>) -> Self {
        self.previewer = Some(previewer);
        self
    }

    pub const fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    /// Remote update time, bounded by the server-down timeout.
    pub async fn update(&self) -> Result<String> {
        self.sync.update().await
    }

    /// Cached posts matching `query`, followed by a refreshed page when the remote changed.
    pub async fn get_all_posts(&self, query: PostQuery) -> PostListUpdates {
        self.sync.get_all_posts(query).await
    }

    /// Wait for any background page fill started by a refresh.
    pub async fn wait_for_page_fill(&self) {
        self.sync.wait_for_page_fill().await;
    }

    /// Save a bookmark remotely and cache the stored result.
    pub async fn add(&self, post: AddPost) -> Result<Post> {
        let url = validate_url(&post.url)?;
        let request = self.build_add_request(post, url).await?;

        let code = self.sync.api().add_bookmark(&request).await?;
        tracing::debug!(url = %request.url, %code, "posts/add answered");

        match code {
            ApiResultCode::Done => {
                self.refresh_last_update().await;
                let posts = sanitize_posts(self.sync.api().fetch_bookmark(&request.url).await?);
                self.sync.store().save(posts.clone()).await?;
                posts
                    .into_iter()
                    .next()
                    .ok_or_else(|| Error::NotFound(request.url))
            }
            ApiResultCode::ItemAlreadyExists => self.get_post(&request.url).await,
            other => Err(Error::Api(other)),
        }
    }

    async fn build_add_request(&self, post: AddPost, url: String) -> Result<AddBookmarkRequest> {
        let defaults = if post.private.is_none() || post.read_later.is_none() {
            self.sync.store().defaults().await?
        } else {
            PostDefaults::default()
        };
        let private = post.private.unwrap_or(defaults.private);
        let read_later = post.read_later.unwrap_or(defaults.read_later);

        let title = take_chars(post.title.trim(), API_MAX_LENGTH);
        let tags = (!post.tags.is_empty()).then(|| take_chars(&post.tags.join(" "), API_MAX_LENGTH));

        // posts/add is a GET, so the description gets whatever the URI budget leaves.
        let used = self.sync.api().base_url().chars().count()
            + url.chars().count()
            + title.chars().count()
            + literal_len(!private)
            + literal_len(read_later)
            + literal_len(post.replace)
            + tags.as_deref().map_or(0, |tags| tags.chars().count());
        let remaining = API_MAX_URI_LENGTH.saturating_sub(used);
        let description = post
            .description
            .map(|description| take_chars(&description, remaining));

        Ok(AddBookmarkRequest {
            url,
            title,
            description,
            private,
            read_later,
            tags,
            replace: post.replace,
        })
    }

    /// Save the url found in shared text, titled from the page it points to.
    ///
    /// Applies the saved defaults and keeps an existing bookmark for the url.
    pub async fn save_shared(&self, text: &str) -> Result<SharedPost> {
        let url = extract_url(text)?;
        let preview = self.preview(&url).await;
        let defaults = self.sync.store().defaults().await?;

        let mut post = AddPost::new(preview.url, preview.title)
            .private(defaults.private)
            .read_later(defaults.read_later)
            .replace(false);
        if let Some(description) = preview.description {
            post = post.with_description(description);
        }

        let post = self.add(post).await?;
        Ok(SharedPost {
            post,
            edit_after_sharing: defaults.edit_after_sharing,
        })
    }

    async fn preview(&self, url: &str) -> UrlPreview {
        if let Some(previewer) = &self.previewer {
            match previewer.preview(url).await {
                Ok(preview) if !preview.title.trim().is_empty() => return preview,
                Ok(_) => tracing::debug!(url, "Shared page has no title"),
                Err(error) => tracing::debug!(%error, url, "Shared page preview failed"),
            }
        }
        UrlPreview::untitled(url)
    }

    /// Delete a bookmark remotely, then from the cache.
    pub async fn delete(&self, url: &str) -> Result<()> {
        let code = self.sync.api().delete_bookmark(url).await?;
        if !code.is_done() {
            return Err(Error::Api(code));
        }

        self.sync.store().delete(url).await?;
        self.refresh_last_update().await;
        Ok(())
    }

    /// A single bookmark, from the cache or else the remote.
    pub async fn get_post(&self, url: &str) -> Result<Post> {
        if let Some(post) = self.sync.store().get(url).await? {
            return Ok(post);
        }

        sanitize_posts(self.sync.api().fetch_bookmark(url).await?)
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(url.to_string()))
    }

    /// Cached tag names starting with `term` (case-insensitive), sorted and unique.
    pub async fn search_existing_post_tag(&self, term: &str) -> Result<Vec<String>> {
        let prefix = term.to_lowercase();
        let mut tags: Vec<String> = self
            .sync
            .store()
            .search_tag_strings(term)
            .await?
            .iter()
            .flat_map(|raw| {
                unescape_html(raw)
                    .split(' ')
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|tag| !tag.is_empty() && tag.to_lowercase().starts_with(&prefix))
            .collect();

        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    /// Tags the remote suggests for `url`. Not cached.
    pub async fn get_suggested_tags_for_url(&self, url: &str) -> Result<SuggestedTags> {
        let url = validate_url(url)?;
        self.sync.api().fetch_suggested_tags(&url).await
    }

    /// Drop every cached post.
    pub async fn clear_cache(&self) -> Result<()> {
        let removed = self.sync.store().delete_all().await?;
        tracing::info!(removed, "Cleared local post cache");
        Ok(())
    }

    pub async fn default_preferences(&self) -> Result<PostDefaults> {
        self.sync.store().defaults().await
    }

    pub async fn set_default_preferences(&self, defaults: PostDefaults) -> Result<()> {
        self.sync.store().set_defaults(defaults).await
    }

    /// Record the remote update time after a write. Best effort.
    async fn refresh_last_update(&self) {
        match self.sync.update().await {
            Ok(update_time) => {
                if let Err(error) = self.sync.store().set_last_update(&update_time).await {
                    tracing::warn!(%error, "Failed to record last update time");
                }
            }
            Err(error) => tracing::debug!(%error, "Update time unavailable after write"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PostsApi;
    use crate::connectivity::StaticConnectivity;
    use crate::models::Tag;
    use crate::services::LocalStore;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    /// Records `posts/add` requests and answers every call from fixed values.
    #[derive(Default)]
    struct RecordingApi {
        add_code: Option<ApiResultCode>,
        requests: Mutex<Vec<AddBookmarkRequest>>,
        remote_posts: Vec<Post>,
    }

    #[async_trait]
    impl PostsApi for RecordingApi {
        async fn fetch_update_time(&self) -> Result<String> {
            Ok("2024-05-01T00:00:00Z".to_string())
        }

        async fn add_bookmark(&self, request: &AddBookmarkRequest) -> Result<ApiResultCode> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.add_code.clone().unwrap_or(ApiResultCode::Done))
        }

        async fn delete_bookmark(&self, _url: &str) -> Result<ApiResultCode> {
            Ok(ApiResultCode::Done)
        }

        async fn fetch_page(&self, _offset: usize, _limit: usize) -> Result<Vec<Post>> {
            Ok(Vec::new())
        }

        async fn fetch_bookmark(&self, url: &str) -> Result<Vec<Post>> {
            Ok(self
                .remote_posts
                .iter()
                .filter(|post| post.url == url)
                .cloned()
                .collect())
        }

        async fn fetch_suggested_tags(&self, _url: &str) -> Result<SuggestedTags> {
            Ok(SuggestedTags {
                popular: vec!["rust".to_string()],
                recommended: Vec::new(),
            })
        }

        async fn fetch_all_tags(&self) -> Result<Vec<Tag>> {
            Ok(Vec::new())
        }
    }

    /// Previewer answering every url with a fixed result.
    struct StubPreviewer(Option<UrlPreview>);

    #[async_trait]
    impl UrlPreviewer for StubPreviewer {
        async fn preview(&self, _url: &str) -> Result<UrlPreview> {
            self.0
                .clone()
                .ok_or_else(|| Error::Transport("connection refused".to_string()))
        }
    }

    fn repository(api: Arc<RecordingApi>) -> PostsRepository {
        let sync = SyncCoordinator::new(
            api,
            LocalStore::open_in_memory().unwrap(),
            Arc::new(StaticConnectivity::online()),
        );
        PostsRepository::new(sync)
    }

    #[test]
    fn validate_url_accepts_known_schemes() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("mailto:someone@example.com").is_ok());
        assert!(validate_url("javascript:void(0)").is_ok());
        assert_eq!(
            validate_url("  ftp://files.example.com  ").unwrap(),
            "ftp://files.example.com"
        );
    }

    #[test]
    fn validate_url_rejects_garbage() {
        assert!(matches!(validate_url(""), Err(Error::InvalidInput(_))));
        assert!(matches!(
            validate_url("not a url"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            validate_url("gopher://example.com"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn add_trims_title_and_tags_to_api_limits() {
        let api = Arc::new(RecordingApi::default());
        let repo = repository(Arc::clone(&api));

        let long_tags: Vec<String> = (0..100).map(|index| format!("tag{index}")).collect();
        let _ = repo
            .add(
                AddPost::new("https://example.com", "t".repeat(400))
                    .with_tags(long_tags)
                    .with_description("d".repeat(5000)),
            )
            .await;

        let requests = api.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.title.chars().count(), API_MAX_LENGTH);
        assert_eq!(
            request.tags.as_deref().map(|tags| tags.chars().count()),
            Some(API_MAX_LENGTH)
        );

        let description_len = request.description.as_deref().map_or(0, str::len);
        let used = crate::config::DEFAULT_API_BASE_URL.len()
            + "https://example.com".len()
            + API_MAX_LENGTH
            + API_MAX_LENGTH
            + 3 // shared=yes
            + 2 // toread=no
            + 3; // replace=yes
        assert_eq!(description_len, API_MAX_URI_LENGTH - used);
    }

    #[tokio::test]
    async fn add_uses_saved_defaults_for_unset_flags() {
        let api = Arc::new(RecordingApi::default());
        let repo = repository(Arc::clone(&api));
        repo.set_default_preferences(PostDefaults {
            private: true,
            read_later: true,
            ..PostDefaults::default()
        })
        .await
        .unwrap();

        let _ = repo
            .add(AddPost::new("https://example.com", "Example").read_later(false))
            .await;

        let requests = api.requests.lock().unwrap();
        assert!(requests[0].private);
        assert!(!requests[0].read_later);
        assert_eq!(requests[0].tags, None);
    }

    #[tokio::test]
    async fn add_rejects_invalid_url_before_calling_remote() {
        let api = Arc::new(RecordingApi::default());
        let repo = repository(Arc::clone(&api));

        let error = repo.add(AddPost::new("nope", "Title")).await.unwrap_err();

        assert!(matches!(error, Error::InvalidInput(_)));
        assert!(api.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_maps_other_codes_to_api_error() {
        let api = Arc::new(RecordingApi {
            add_code: Some(ApiResultCode::MustProvideTitle),
            ..RecordingApi::default()
        });
        let repo = repository(api);

        let error = repo
            .add(AddPost::new("https://example.com", ""))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            Error::Api(ApiResultCode::MustProvideTitle)
        ));
    }

    #[tokio::test]
    async fn add_done_caches_remote_post_and_records_update() {
        let mut remote = Post::new("https://example.com", "Example");
        remote.tags = vec!["a&amp;b".to_string()];
        let api = Arc::new(RecordingApi {
            remote_posts: vec![remote],
            ..RecordingApi::default()
        });
        let repo = repository(api);

        let post = repo
            .add(AddPost::new("https://example.com", "Example"))
            .await
            .unwrap();

        assert_eq!(post.tags, vec!["a&b"]);
        let cached = repo.sync().store().get("https://example.com").await.unwrap();
        assert_eq!(cached, Some(post));
        assert_eq!(
            repo.sync().store().last_update().await.unwrap(),
            "2024-05-01T00:00:00Z"
        );
    }

    #[tokio::test]
    async fn get_post_missing_everywhere_is_not_found() {
        let repo = repository(Arc::new(RecordingApi::default()));

        let error = repo.get_post("https://missing.example").await.unwrap_err();

        assert!(matches!(error, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn search_existing_post_tag_filters_by_prefix() {
        let repo = repository(Arc::new(RecordingApi::default()));
        let mut first = Post::new("https://a.example", "A");
        first.tags = vec!["Rust".to_string(), "rustacean".to_string(), "go".to_string()];
        let mut second = Post::new("https://b.example", "B");
        second.tags = vec!["rust".to_string(), "trust".to_string()];
        repo.sync().store().save(vec![first, second]).await.unwrap();

        let tags = repo.search_existing_post_tag("rust").await.unwrap();

        assert_eq!(tags, vec!["Rust", "rust", "rustacean"]);
    }

    #[tokio::test]
    async fn suggested_tags_validate_url() {
        let repo = repository(Arc::new(RecordingApi::default()));

        assert!(repo.get_suggested_tags_for_url("::").await.is_err());
        let suggested = repo
            .get_suggested_tags_for_url("https://example.com")
            .await
            .unwrap();
        assert_eq!(suggested.popular, vec!["rust"]);
    }

    #[tokio::test]
    async fn clear_cache_empties_store() {
        let repo = repository(Arc::new(RecordingApi::default()));
        repo.sync()
            .store()
            .save(vec![Post::new("https://a.example", "A")])
            .await
            .unwrap();

        repo.clear_cache().await.unwrap();

        assert_eq!(
            repo.sync().store().count(&PostQuery::all()).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn save_shared_keeps_existing_post() {
        let api = Arc::new(RecordingApi {
            add_code: Some(ApiResultCode::ItemAlreadyExists),
            ..RecordingApi::default()
        });
        let repo = repository(Arc::clone(&api)).with_url_previewer(Arc::new(StubPreviewer(
            Some(UrlPreview {
                url: "https://example.com/a".to_string(),
                title: "Fresh title".to_string(),
                description: Some("Summary".to_string()),
            }),
        )));
        repo.set_default_preferences(PostDefaults {
            private: true,
            read_later: false,
            edit_after_sharing: true,
        })
        .await
        .unwrap();
        let existing = Post::new("https://example.com/a", "Saved earlier");
        repo.sync().store().save(vec![existing.clone()]).await.unwrap();

        let shared = repo
            .save_shared("Worth a read: https://example.com/a.")
            .await
            .unwrap();

        assert_eq!(shared.post, existing);
        assert!(shared.edit_after_sharing);
        let requests = api.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://example.com/a");
        assert_eq!(requests[0].title, "Fresh title");
        assert_eq!(requests[0].description.as_deref(), Some("Summary"));
        assert!(requests[0].private);
        assert!(!requests[0].read_later);
        assert!(!requests[0].replace);
    }

    #[tokio::test]
    async fn save_shared_titles_with_url_when_preview_fails() {
        let api = Arc::new(RecordingApi {
            remote_posts: vec![Post::new("https://example.com/b", "https://example.com/b")],
            ..RecordingApi::default()
        });
        let repo = repository(Arc::clone(&api)).with_url_previewer(Arc::new(StubPreviewer(None)));

        let shared = repo.save_shared("https://example.com/b").await.unwrap();

        assert_eq!(shared.post.url, "https://example.com/b");
        assert!(!shared.edit_after_sharing);
        let requests = api.requests.lock().unwrap();
        assert_eq!(requests[0].title, "https://example.com/b");
        assert_eq!(requests[0].description, None);
    }

    #[tokio::test]
    async fn save_shared_rejects_text_without_url() {
        let api = Arc::new(RecordingApi::default());
        let repo = repository(Arc::clone(&api));

        let error = repo.save_shared("just some words").await.unwrap_err();

        assert!(matches!(error, Error::InvalidInput(_)));
        assert!(api.requests.lock().unwrap().is_empty());
    }
}
