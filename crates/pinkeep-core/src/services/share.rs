//! Turning shared text into a bookmark.
//!
//! Shared text is whatever another app hands over: a bare url, a title
//! followed by a link, a whole paragraph. [`extract_url`] finds the link and a
//! [`UrlPreviewer`] resolves the page title and description for it.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;

use super::posts::validate_url;
use crate::error::{Error, Result};
use crate::models::Post;
use crate::util::{compact_text, unescape_html};

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}'];

/// Final url, title and description of a shared page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPreview {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
}

impl UrlPreview {
    /// Preview for a page that could not be read; the url doubles as title.
    pub fn untitled(url: &str) -> Self {
        Self {
            url: url.to_string(),
            title: url.to_string(),
            description: None,
        }
    }
}

/// Outcome of saving shared text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedPost {
    pub post: Post,
    /// The user asked to review posts saved from a share
    pub edit_after_sharing: bool,
}

/// Resolves the title and description of a page.
#[async_trait]
pub trait UrlPreviewer: Send + Sync {
    async fn preview(&self, url: &str) -> Result<UrlPreview>;
}

/// Fetches the page over HTTP and reads its `<title>` and description meta tag.
#[derive(Debug, Clone)]
pub struct HttpUrlPreviewer {
    client: reqwest::Client,
}

impl HttpUrlPreviewer {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pinkeep/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UrlPreviewer for HttpUrlPreviewer {
    async fn preview(&self, url: &str) -> Result<UrlPreview> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("HTTP {}: {url}", status.as_u16())));
        }

        let final_url = response.url().to_string();
        let html = response.text().await?;
        let metadata = parse_page_metadata(&html);

        Ok(UrlPreview {
            title: metadata.title.unwrap_or_else(|| final_url.clone()),
            url: final_url,
            description: metadata.description,
        })
    }
}

/// First usable url in `text`.
///
/// Prefers an embedded `http(s)` link; otherwise the whole text must be a url
/// with an accepted scheme.
pub fn extract_url(text: &str) -> Result<String> {
    if let Some(url) = find_web_url(text) {
        return Ok(url);
    }
    validate_url(text).map_err(|_| {
        Error::InvalidInput(format!("no url found in '{}'", compact_text(text)))
    })
}

fn find_web_url(text: &str) -> Option<String> {
    let url_re = Regex::new(r#"(?i)\bhttps?://[^\s<>"']+"#).ok()?;
    let found_url = url_re.find_iter(text).find_map(|found| {
        let candidate = found.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        url::Url::parse(candidate)
            .ok()
            .map(|_| candidate.to_string())
    });
    found_url
}

/// Title and description found in a page's markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
}

pub fn parse_page_metadata(html: &str) -> PageMetadata {
    PageMetadata {
        title: find_title(html),
        description: find_description(html),
    }
}

fn find_title(html: &str) -> Option<String> {
    let title_re = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok()?;
    title_re
        .captures(html)
        .and_then(|cap| cap.get(1))
        .and_then(|found| clean_text(found.as_str()))
}

fn find_description(html: &str) -> Option<String> {
    // name/property before content, or the reverse
    let meta_re = Regex::new(
        r#"(?is)<meta[^>]*(?:name|property)\s*=\s*["'](?:og:)?description["'][^>]*content\s*=\s*["']([^"']*)["']"#,
    )
    .ok()?;
    let meta_re2 = Regex::new(
        r#"(?is)<meta[^>]*content\s*=\s*["']([^"']*)["'][^>]*(?:name|property)\s*=\s*["'](?:og:)?description["']"#,
    )
    .ok()?;

    meta_re
        .captures(html)
        .or_else(|| meta_re2.captures(html))
        .and_then(|cap| cap.get(1))
        .and_then(|found| clean_text(found.as_str()))
}

fn clean_text(raw: &str) -> Option<String> {
    let collapsed = unescape_html(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}
