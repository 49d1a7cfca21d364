//! Data models for pinkeep

mod post;
mod query;
mod settings;
mod tag;

pub use post::{parse_tags, split_tags, Post, PostListResult};
pub use query::{
    PostQuery, SortOrder, TagFilter, Visibility, DEFAULT_PAGE_SIZE, MAX_FILTER_TAGS,
};
pub use settings::{PostDefaults, Preferences};
pub use tag::{SuggestedTags, Tag};
