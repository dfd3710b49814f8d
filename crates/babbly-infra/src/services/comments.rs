use serde::de::IgnoredAny;

use babbly_core::domain::{AccessToken, Comment, Page, PageRequest};
use babbly_core::{ApiResult, validate_content};
use babbly_shared::dto::{CreateCommentRequest, UpdateCommentRequest};

use super::Listing;
use crate::http::ApiClient;

/// Comment thread endpoints.
#[derive(Clone)]
pub struct CommentService {
    client: ApiClient,
}

impl CommentService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        post_id: &str,
        page: PageRequest,
        token: Option<&AccessToken>,
    ) -> ApiResult<Page<Comment>> {
        let listing: Listing<Comment> = self
            .client
            .get(&format!("/api/comments/post/{post_id}"), page.query(), token)
            .await?;
        Ok(listing.into())
    }

    pub async fn create(&self, post_id: &str, content: &str, token: &AccessToken) -> ApiResult<Comment> {
        let content = validate_content(content)?;
        let body = CreateCommentRequest {
            post_id: post_id.to_string(),
            content: content.to_string(),
        };
        self.client.post("/api/comments", &body, token).await
    }

    pub async fn update(&self, id: &str, content: &str, token: &AccessToken) -> ApiResult<Comment> {
        let content = validate_content(content)?;
        let body = UpdateCommentRequest {
            content: content.to_string(),
        };
        self.client
            .put(&format!("/api/comments/{id}"), &body, token)
            .await
    }

    pub async fn delete(&self, id: &str, token: &AccessToken) -> ApiResult<()> {
        let _: IgnoredAny = self
            .client
            .delete(&format!("/api/comments/{id}"), token)
            .await?;
        Ok(())
    }
}
