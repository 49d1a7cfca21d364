//! HTTP client for the Pinboard v1 API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::types::{
    suggested_tags_from, tags_from, ApiResultCode, GenericResponse, GetPostDto, PostDto,
    SuggestionDto, TagCountDto, UpdateDto,
};
use crate::config::{ClientConfig, DEFAULT_API_BASE_URL};
use crate::error::{Error, Result};
use crate::models::{Post, SuggestedTags, Tag};
use crate::util::compact_text;

const YES: &str = "yes";
const NO: &str = "no";

/// Parameters of a `posts/add` call, already trimmed to the API limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddBookmarkRequest {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub private: bool,
    pub read_later: bool,
    /// Space-separated tag names
    pub tags: Option<String>,
    pub replace: bool,
}

/// Remote operations the posts data layer depends on.
#[async_trait]
pub trait PostsApi: Send + Sync {
    /// Base URL requests are sent to, used to size `posts/add` query strings.
    fn base_url(&self) -> &str {
        DEFAULT_API_BASE_URL
    }

    /// Time of the most recent change to the user's bookmarks.
    async fn fetch_update_time(&self) -> Result<String>;

    async fn add_bookmark(&self, request: &AddBookmarkRequest) -> Result<ApiResultCode>;

    async fn delete_bookmark(&self, url: &str) -> Result<ApiResultCode>;

    /// One page of `posts/all`, newest first.
    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<Post>>;

    /// The posts stored for exactly `url` (zero or one in practice).
    async fn fetch_bookmark(&self, url: &str) -> Result<Vec<Post>>;

    async fn fetch_suggested_tags(&self, url: &str) -> Result<SuggestedTags>;

    async fn fetch_all_tags(&self) -> Result<Vec<Tag>>;
}

/// Status and body of a completed request.
///
/// A request that hits the client timeout is reported as a synthetic `408`
/// so callers see one shape for every outcome.
#[derive(Debug)]
struct RawResponse {
    status: StatusCode,
    body: String,
}

impl RawResponse {
    fn timed_out() -> Self {
        Self {
            status: StatusCode::REQUEST_TIMEOUT,
            body: "{}".to_string(),
        }
    }

    fn decode<T: DeserializeOwned>(self) -> Result<T> {
        if self.status == StatusCode::REQUEST_TIMEOUT {
            return Err(Error::Timeout);
        }
        if !self.status.is_success() {
            let body = compact_text(&self.body);
            return Err(Error::Transport(if body.is_empty() {
                format!("HTTP {}", self.status.as_u16())
            } else {
                format!("HTTP {}: {body}", self.status.as_u16())
            }));
        }
        serde_json::from_str(&self.body)
            .map_err(|error| Error::Transport(format!("Invalid response payload: {error}")))
    }
}

/// `reqwest`-backed [`PostsApi`].
#[derive(Clone)]
pub struct PinboardClient {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for PinboardClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("PinboardClient")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl PinboardClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate().map_err(Error::InvalidInput)?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("pinkeep/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: config.normalized_base_url(),
            auth_token: config.auth_token(),
            client,
        })
    }

    async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<RawResponse> {
        let mut query: Vec<(&str, &str)> = vec![("format", "json")];
        if let Some(token) = self.auth_token.as_deref() {
            query.push(("auth_token", token));
        }
        query.extend_from_slice(params);

        tracing::debug!(endpoint, "Sending API request");

        let response = match self
            .client
            .get(format!("{}{endpoint}", self.base_url))
            .query(&query)
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) if error.is_timeout() => return Ok(RawResponse::timed_out()),
            Err(error) => return Err(error.into()),
        };

        let status = response.status();
        match response.text().await {
            Ok(body) => Ok(RawResponse { status, body }),
            Err(error) if error.is_timeout() => Ok(RawResponse::timed_out()),
            Err(error) => Err(error.into()),
        }
    }
}

const fn yes_no(value: bool) -> &'static str {
    if value {
        YES
    } else {
        NO
    }
}

#[async_trait]
impl PostsApi for PinboardClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_update_time(&self) -> Result<String> {
        let update: UpdateDto = self.get("posts/update", &[]).await?.decode()?;
        Ok(update.update_time)
    }

    async fn add_bookmark(&self, request: &AddBookmarkRequest) -> Result<ApiResultCode> {
        let mut params = vec![
            ("url", request.url.as_str()),
            ("description", request.title.as_str()),
            ("shared", yes_no(!request.private)),
            ("toread", yes_no(request.read_later)),
            ("replace", yes_no(request.replace)),
        ];
        if let Some(description) = request.description.as_deref() {
            params.push(("extended", description));
        }
        if let Some(tags) = request.tags.as_deref() {
            params.push(("tags", tags));
        }

        let response: GenericResponse = self.get("posts/add", &params).await?.decode()?;
        Ok(response.into_code())
    }

    async fn delete_bookmark(&self, url: &str) -> Result<ApiResultCode> {
        let response: GenericResponse = self
            .get("posts/delete", &[("url", url)])
            .await?
            .decode()?;
        Ok(response.into_code())
    }

    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<Post>> {
        let start = offset.to_string();
        let results = limit.to_string();
        let posts: Vec<PostDto> = self
            .get("posts/all", &[("start", start.as_str()), ("results", results.as_str())])
            .await?
            .decode()?;
        Ok(posts.into_iter().map(Post::from).collect())
    }

    async fn fetch_bookmark(&self, url: &str) -> Result<Vec<Post>> {
        let response: GetPostDto = self.get("posts/get", &[("url", url)]).await?.decode()?;
        Ok(response.posts.into_iter().map(Post::from).collect())
    }

    async fn fetch_suggested_tags(&self, url: &str) -> Result<SuggestedTags> {
        let items: Vec<SuggestionDto> = self
            .get("posts/suggest", &[("url", url)])
            .await?
            .decode()?;
        Ok(suggested_tags_from(items))
    }

    async fn fetch_all_tags(&self) -> Result<Vec<Tag>> {
        let map: BTreeMap<String, TagCountDto> = self.get("tags/get", &[]).await?.decode()?;
        Ok(tags_from(map))
    }
}
