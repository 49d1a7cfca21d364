//! Shared services used by every front end.

mod posts;
mod share;
mod store;
mod tags;

pub use posts::{validate_url, AddPost, PostsRepository};
pub use share::{
    extract_url, parse_page_metadata, HttpUrlPreviewer, PageMetadata, SharedPost, UrlPreview,
    UrlPreviewer,
};
pub use store::{LocalStore, PreferenceStore, WriteFence, WriteTicket};
pub use tags::TagsRepository;
