//! Remote tag listing.

use std::sync::Arc;

use crate::api::PostsApi;
use crate::error::Result;
use crate::models::Tag;

#[derive(Clone)]
pub struct TagsRepository {
    api: Arc<dyn PostsApi>,
}

impl TagsRepository {
    pub fn new(api: Arc<dyn PostsApi>) -> Self {
        Self { api }
    }

    /// Every tag the user has, with usage counts, sorted by name.
    pub async fn get_all_tags(&self) -> Result<Vec<Tag>> {
        let mut tags = self.api.fetch_all_tags().await?;
        tags.sort_by(|left, right| {
            left.name
                .to_lowercase()
                .cmp(&right.name.to_lowercase())
                .then_with(|| left.name.cmp(&right.name))
        });
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AddBookmarkRequest, ApiResultCode};
    use crate::models::{Post, SuggestedTags};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct FixedTagsApi(Vec<Tag>);

    #[async_trait]
    impl PostsApi for FixedTagsApi {
        async fn fetch_update_time(&self) -> Result<String> {
            Ok(String::new())
        }

        async fn add_bookmark(&self, _request: &AddBookmarkRequest) -> Result<ApiResultCode> {
            Ok(ApiResultCode::Done)
        }

        async fn delete_bookmark(&self, _url: &str) -> Result<ApiResultCode> {
            Ok(ApiResultCode::Done)
        }

        async fn fetch_page(&self, _offset: usize, _limit: usize) -> Result<Vec<Post>> {
            Ok(Vec::new())
        }

        async fn fetch_bookmark(&self, _url: &str) -> Result<Vec<Post>> {
            Ok(Vec::new())
        }

        async fn fetch_suggested_tags(&self, _url: &str) -> Result<SuggestedTags> {
            Ok(SuggestedTags::default())
        }

        async fn fetch_all_tags(&self) -> Result<Vec<Tag>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn tags_are_sorted_case_insensitively() {
        let repo = TagsRepository::new(Arc::new(FixedTagsApi(vec![
            Tag {
                name: "zig".to_string(),
                count: 1,
            },
            Tag {
                name: "Rust".to_string(),
                count: 4,
            },
            Tag {
                name: "go".to_string(),
                count: 2,
            },
        ])));

        let names: Vec<String> = repo
            .get_all_tags()
            .await
            .unwrap()
            .into_iter()
            .map(|tag| tag.name)
            .collect();

        assert_eq!(names, vec!["go", "Rust", "zig"]);
    }
}
