//! Query parameters for reading cached posts

use serde::{Deserialize, Serialize};

/// Default number of posts returned per local page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Maximum number of tags a query filters on; extra tags are ignored
pub const MAX_FILTER_TAGS: usize = 3;

/// Ordering of the returned posts by save time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Tag constraint of a query
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagFilter {
    /// Any tags, including none
    #[default]
    None,
    /// Only posts without tags
    Untagged,
    /// Posts carrying every one of the given tags (first three only)
    Tagged(Vec<String>),
}

/// Visibility constraint of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    None,
    Public,
    Private,
}

/// Filter, sort and pagination for a local post query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostQuery {
    pub sort: SortOrder,
    /// Case-insensitive substring matched against url, title, description and tags
    pub search_term: String,
    pub tags: TagFilter,
    pub visibility: Visibility,
    pub read_later_only: bool,
    /// Upper bound on `total_count`; `None` counts every match
    pub count_limit: Option<usize>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            sort: SortOrder::default(),
            search_term: String::new(),
            tags: TagFilter::default(),
            visibility: Visibility::default(),
            read_later_only: false,
            count_limit: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl PostQuery {
    /// Query matching every cached post, first page
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = TagFilter::Tagged(tags.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn untagged(mut self) -> Self {
        self.tags = TagFilter::Untagged;
        self
    }

    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub const fn read_later(mut self) -> Self {
        self.read_later_only = true;
        self
    }

    #[must_use]
    pub const fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub const fn with_page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    #[must_use]
    pub const fn with_count_limit(mut self, count_limit: usize) -> Self {
        self.count_limit = Some(count_limit);
        self
    }

    /// The non-blank tag names this query filters on, at most [`MAX_FILTER_TAGS`]
    pub fn filter_tags(&self) -> Vec<&str> {
        match &self.tags {
            TagFilter::Tagged(tags) => tags
                .iter()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .take(MAX_FILTER_TAGS)
                .collect(),
            TagFilter::None | TagFilter::Untagged => Vec::new(),
        }
    }
}
