//! Wire types for the Pinboard v1 JSON API.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{split_tags, Post, SuggestedTags, Tag};

/// Application-level outcome of a write call (`posts/add`, `posts/delete`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResultCode {
    Done,
    MissingUrl,
    MustProvideTitle,
    ItemAlreadyExists,
    ItemNotFound,
    /// Any code the client does not know, kept verbatim
    Other(String),
}

impl ApiResultCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Done => "done",
            Self::MissingUrl => "missing url",
            Self::MustProvideTitle => "must provide title",
            Self::ItemAlreadyExists => "item already exists",
            Self::ItemNotFound => "item not found",
            Self::Other(code) => code,
        }
    }

    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl From<&str> for ApiResultCode {
    fn from(code: &str) -> Self {
        match code.trim() {
            "done" => Self::Done,
            "missing url" => Self::MissingUrl,
            "must provide title" => Self::MustProvideTitle,
            "item already exists" => Self::ItemAlreadyExists,
            "item not found" => Self::ItemNotFound,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ApiResultCode {
    fn from(code: String) -> Self {
        Self::from(code.as_str())
    }
}

impl fmt::Display for ApiResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `posts/add` and `posts/delete`.
#[derive(Debug, Deserialize)]
pub(crate) struct GenericResponse {
    result_code: String,
}

impl GenericResponse {
    pub(crate) fn into_code(self) -> ApiResultCode {
        ApiResultCode::from(self.result_code)
    }
}

/// Body of `posts/update`.
#[derive(Debug, Deserialize)]
pub(crate) struct UpdateDto {
    pub(crate) update_time: String,
}

/// Body of `posts/get`.
#[derive(Debug, Deserialize)]
pub(crate) struct GetPostDto {
    #[serde(default)]
    pub(crate) posts: Vec<PostDto>,
}

/// One bookmark as returned by `posts/all` and `posts/get`.
///
/// The remote calls the title `description` and the notes `extended`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostDto {
    pub href: String,
    pub description: String,
    pub extended: String,
    pub hash: String,
    pub time: String,
    pub shared: String,
    pub toread: String,
    pub tags: String,
}

impl From<PostDto> for Post {
    fn from(dto: PostDto) -> Self {
        Self {
            url: dto.href,
            title: dto.description,
            description: dto.extended,
            hash: dto.hash,
            time: dto.time,
            // Posts are public unless the remote says otherwise.
            private: dto.shared == "no",
            read_later: dto.toread == "yes",
            // Entities are decoded once, when the posts are sanitized for the cache.
            tags: split_tags(&dto.tags),
        }
    }
}

/// `posts/suggest` returns `[{"popular": [..]}, {"recommended": [..]}]`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SuggestionDto {
    #[serde(default)]
    popular: Option<Vec<String>>,
    #[serde(default)]
    recommended: Option<Vec<String>>,
}

pub(crate) fn suggested_tags_from(items: Vec<SuggestionDto>) -> SuggestedTags {
    let mut suggested = SuggestedTags::default();
    for item in items {
        if let Some(popular) = item.popular {
            suggested.popular.extend(popular);
        }
        if let Some(recommended) = item.recommended {
            suggested.recommended.extend(recommended);
        }
    }
    suggested
}

/// Usage count in `tags/get`; older servers send it as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum TagCountDto {
    Number(u64),
    Text(String),
}

impl TagCountDto {
    fn count(&self) -> usize {
        match self {
            Self::Number(count) => usize::try_from(*count).unwrap_or(usize::MAX),
            Self::Text(count) => count.trim().parse().unwrap_or_default(),
        }
    }
}

pub(crate) fn tags_from(map: BTreeMap<String, TagCountDto>) -> Vec<Tag> {
    map.into_iter()
        .map(|(name, count)| Tag {
            count: count.count(),
            name,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn result_codes_parse_known_and_unknown_values() {
        assert_eq!(ApiResultCode::from("done"), ApiResultCode::Done);
        assert_eq!(ApiResultCode::from("missing url"), ApiResultCode::MissingUrl);
        assert_eq!(
            ApiResultCode::from("must provide title"),
            ApiResultCode::MustProvideTitle
        );
        assert_eq!(
            ApiResultCode::from("item already exists"),
            ApiResultCode::ItemAlreadyExists
        );
        assert_eq!(
            ApiResultCode::from("item not found"),
            ApiResultCode::ItemNotFound
        );
        assert_eq!(
            ApiResultCode::from("something went wrong"),
            ApiResultCode::Other("something went wrong".to_string())
        );
        assert_eq!(
            ApiResultCode::Other("odd".to_string()).to_string(),
            "odd".to_string()
        );
    }

    #[test]
    fn generic_response_decodes_result_code() {
        let body: GenericResponse =
            serde_json::from_str(r#"{"result_code":"item already exists"}"#).unwrap();
        assert_eq!(body.into_code(), ApiResultCode::ItemAlreadyExists);
    }

    #[test]
    fn post_dto_maps_flags_and_keeps_tags_escaped() {
        let json = r#"{
            "href": "https://example.com/",
            "description": "Example",
            "extended": "notes",
            "meta": "abc",
            "hash": "3f2a",
            "time": "2024-01-31T12:00:00Z",
            "shared": "no",
            "toread": "yes",
            "tags": "cats&amp;dogs rust"
        }"#;
        let post: Post = serde_json::from_str::<PostDto>(json).unwrap().into();

        assert_eq!(post.url, "https://example.com/");
        assert_eq!(post.title, "Example");
        assert_eq!(post.description, "notes");
        assert_eq!(post.hash, "3f2a");
        assert!(post.private);
        assert!(post.read_later);
        assert_eq!(post.tags, vec!["cats&amp;dogs", "rust"]);
    }

    #[test]
    fn post_dto_tolerates_missing_fields() {
        let post: Post = serde_json::from_str::<PostDto>(r#"{"href":"https://a.example"}"#)
            .unwrap()
            .into();
        assert_eq!(post.url, "https://a.example");
        assert!(!post.private);
        assert!(!post.read_later);
        assert!(post.tags.is_empty());
    }

    #[test]
    fn suggestions_merge_both_lists() {
        let items: Vec<SuggestionDto> =
            serde_json::from_str(r#"[{"popular":["rust","lang"]},{"recommended":["code"]}]"#)
                .unwrap();
        let suggested = suggested_tags_from(items);
        assert_eq!(suggested.popular, vec!["rust", "lang"]);
        assert_eq!(suggested.recommended, vec!["code"]);
    }

    #[test]
    fn tag_counts_accept_strings_and_numbers() {
        let map: BTreeMap<String, TagCountDto> =
            serde_json::from_str(r#"{"rust":"12","cats":3,"odd":"n/a"}"#).unwrap();
        let tags = tags_from(map);
        assert_eq!(
            tags,
            vec![
                Tag {
                    name: "cats".to_string(),
                    count: 3
                },
                Tag {
                    name: "odd".to_string(),
                    count: 0
                },
                Tag {
                    name: "rust".to_string(),
                    count: 12
                },
            ]
        );
    }
}
