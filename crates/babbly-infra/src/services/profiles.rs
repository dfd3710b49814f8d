use babbly_core::ApiResult;
use babbly_core::domain::{AccessToken, PageRequest, PublicProfile};

use crate::http::ApiClient;

/// Public profile lookups.
#[derive(Clone)]
pub struct ProfileService {
    client: ApiClient,
}

impl ProfileService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Profile plus one page of the user's posts.
    pub async fn by_username(
        &self,
        username: &str,
        posts: PageRequest,
        token: Option<&AccessToken>,
    ) -> ApiResult<PublicProfile> {
        self.client
            .get(&format!("/api/profiles/username/{username}"), posts_query(posts), token)
            .await
    }

    pub async fn by_id(
        &self,
        user_id: &str,
        posts: PageRequest,
        token: Option<&AccessToken>,
    ) -> ApiResult<PublicProfile> {
        self.client
            .get(&format!("/api/profiles/id/{user_id}"), posts_query(posts), token)
            .await
    }

    /// The caller's own profile.
    pub async fn me(&self, posts: PageRequest, token: &AccessToken) -> ApiResult<PublicProfile> {
        self.client
            .get("/api/profiles/me", posts_query(posts), Some(token))
            .await
    }
}

fn posts_query(posts: PageRequest) -> Vec<(&'static str, String)> {
    vec![
        ("postsPage", posts.page.to_string()),
        ("postsPageSize", posts.page_size.to_string()),
    ]
}
