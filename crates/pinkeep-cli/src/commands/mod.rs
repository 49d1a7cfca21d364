pub mod add;
pub mod clear_cache;
pub mod common;
pub mod completions;
pub mod config;
pub mod delete;
pub mod get;
pub mod list;
pub mod share;
pub mod suggest;
pub mod sync;
pub mod tags;
