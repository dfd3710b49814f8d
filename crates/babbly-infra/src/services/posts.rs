use serde::de::IgnoredAny;

use babbly_core::domain::{AccessToken, Page, PageRequest, Post};
use babbly_core::{ApiResult, validate_content};
use babbly_shared::dto::{CreatePostRequest, UpdatePostRequest};

use super::Listing;
use crate::http::ApiClient;

/// Feed and single-post endpoints.
#[derive(Clone)]
pub struct PostService {
    client: ApiClient,
}

impl PostService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: PageRequest, token: Option<&AccessToken>) -> ApiResult<Page<Post>> {
        tracing::debug!(page = page.page, page_size = page.page_size, "Fetching feed page");
        let listing: Listing<Post> = self.client.get("/api/posts", page.query(), token).await?;
        Ok(listing.into())
    }

    pub async fn get(&self, id: &str, token: Option<&AccessToken>) -> ApiResult<Post> {
        self.client
            .get(&format!("/api/posts/{id}"), Vec::new(), token)
            .await
    }

    /// Content is checked locally first; nothing is sent when it fails.
    pub async fn create(&self, content: &str, token: &AccessToken) -> ApiResult<Post> {
        let content = validate_content(content)?;
        let body = CreatePostRequest {
            content: content.to_string(),
        };
        self.client.post("/api/posts", &body, token).await
    }

    pub async fn update(&self, id: &str, content: &str, token: &AccessToken) -> ApiResult<Post> {
        let content = validate_content(content)?;
        let body = UpdatePostRequest {
            content: content.to_string(),
        };
        self.client
            .put(&format!("/api/posts/{id}"), &body, token)
            .await
    }

    pub async fn delete(&self, id: &str, token: &AccessToken) -> ApiResult<()> {
        let _: IgnoredAny = self
            .client
            .delete(&format!("/api/posts/{id}"), token)
            .await?;
        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }
}
