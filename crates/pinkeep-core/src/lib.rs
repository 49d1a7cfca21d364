//! pinkeep-core - Core library for pinkeep
//!
//! This crate contains the models, local post cache, remote API client and
//! sync logic behind the pinkeep bookmarking client. Front ends talk to
//! [`PostsRepository`] and [`TagsRepository`].

pub mod api;
pub mod config;
pub mod connectivity;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod sync;
pub mod util;

pub use error::{Error, ErrorKind, Result};
pub use models::{Post, PostListResult, PostQuery, Tag};
pub use services::{AddPost, LocalStore, PostsRepository, TagsRepository};
pub use sync::{PostListUpdates, SyncCoordinator};
