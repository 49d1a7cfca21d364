//! Post (bookmark) model

use serde::{Deserialize, Serialize};

use crate::util::unescape_html;

/// A saved bookmark, keyed by its url
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Bookmarked url, the natural identity of a post
    pub url: String,
    /// Title shown in listings
    pub title: String,
    /// Free-form notes
    pub description: String,
    /// Change hash reported by the remote (empty when unknown)
    pub hash: String,
    /// Save time as reported by the remote (`2024-01-31T12:00:00Z`)
    pub time: String,
    /// Whether the post is hidden from other users
    pub private: bool,
    /// Whether the post is marked to read later
    pub read_later: bool,
    /// Tag names, in the order they were given, without duplicates
    pub tags: Vec<String>,
}

impl Post {
    /// Create a public, untagged post with the given url and title
    #[must_use]
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: String::new(),
            hash: String::new(),
            time: crate::util::now_as_tz_format(),
            private: false,
            read_later: false,
            tags: Vec::new(),
        }
    }

    /// Tags joined the way they are stored and sent (space separated)
    #[must_use]
    pub fn tags_string(&self) -> String {
        self.tags.join(" ")
    }
}

/// Split a space-separated tag string into an ordered, de-duplicated list.
#[must_use]
pub fn split_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split_whitespace() {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Like [`split_tags`], decoding the HTML entities the remote escapes tags with.
///
/// # Examples
///
/// ```
/// use pinkeep_core::models::parse_tags;
///
/// let tags = parse_tags("rust  cats&amp;dogs rust");
/// assert_eq!(tags, vec!["rust".to_string(), "cats&dogs".to_string()]);
/// ```
#[must_use]
pub fn parse_tags(raw: &str) -> Vec<String> {
    split_tags(&unescape_html(raw))
}

/// One page of locally cached posts matching a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostListResult {
    /// Number of rows matching the query (capped by `count_limit` when set)
    pub total_count: usize,
    /// The requested page of posts
    pub posts: Vec<Post>,
    /// Whether the cache was known to match the remote when the page was read
    pub up_to_date: bool,
}
