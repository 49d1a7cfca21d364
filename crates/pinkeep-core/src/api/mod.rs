//! Remote API layer: wire types, the HTTP client and call pacing.

mod client;
mod rate_limit;
mod types;

pub use client::{AddBookmarkRequest, PinboardClient, PostsApi};
pub use rate_limit::RateLimiter;
pub use types::{ApiResultCode, PostDto};

/// Longest title or tag string the API accepts.
pub const API_MAX_LENGTH: usize = 255;
/// Longest request URI the API accepts; `posts/add` sends everything as query parameters.
pub const API_MAX_URI_LENGTH: usize = 2000;
