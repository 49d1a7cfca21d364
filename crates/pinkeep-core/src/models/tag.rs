//! Tag model

use serde::{Deserialize, Serialize};

/// A tag and the number of posts using it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name, case preserved
    pub name: String,
    /// Number of posts using the tag, as reported by the remote. Advisory only.
    pub count: usize,
}

impl Tag {
    /// Create a tag with no known usage count
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
        }
    }
}

/// Tags the remote suggests for a url
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedTags {
    /// Tags other users commonly apply to this url
    pub popular: Vec<String>,
    /// Tags drawn from the user's own vocabulary
    pub recommended: Vec<String>,
}
