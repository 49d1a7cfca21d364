//! User preference model

use serde::{Deserialize, Serialize};

/// Attributes applied to new posts when the caller does not choose them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDefaults {
    /// Save new posts as private
    pub private: bool,
    /// Mark new posts to read later
    pub read_later: bool,
    /// Show a post saved from shared text for review
    #[serde(default)]
    pub edit_after_sharing: bool,
}

/// Persisted user preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Remote update time recorded after the last successful sync; empty before the first one
    pub last_update: String,
    /// Defaults for new posts
    pub defaults: PostDefaults,
}
