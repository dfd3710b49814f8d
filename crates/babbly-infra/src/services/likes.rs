use std::fmt;

use babbly_core::ApiResult;
use babbly_core::domain::AccessToken;
use babbly_shared::dto::{LikeRequest, LikeResponse};

use crate::http::ApiClient;

/// What a like applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Post(String),
    Comment(String),
}

impl LikeTarget {
    fn request(&self) -> LikeRequest {
        match self {
            LikeTarget::Post(id) => LikeRequest::post(id),
            LikeTarget::Comment(id) => LikeRequest::comment(id),
        }
    }
}

impl fmt::Display for LikeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LikeTarget::Post(id) => write!(f, "post:{id}"),
            LikeTarget::Comment(id) => write!(f, "comment:{id}"),
        }
    }
}

/// `POST`/`DELETE /api/likes`.
#[derive(Clone)]
pub struct LikeService {
    client: ApiClient,
}

impl LikeService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn like(&self, target: &LikeTarget, token: &AccessToken) -> ApiResult<LikeResponse> {
        tracing::debug!(%target, "Liking");
        self.client.post("/api/likes", &target.request(), token).await
    }

    pub async fn unlike(&self, target: &LikeTarget, token: &AccessToken) -> ApiResult<LikeResponse> {
        tracing::debug!(%target, "Unliking");
        self.client
            .delete_with("/api/likes", &target.request(), token)
            .await
    }
}
