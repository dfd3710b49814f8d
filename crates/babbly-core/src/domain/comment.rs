use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id;
use super::post::Author;

/// Comment entity - scoped under a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(deserialize_with = "id::string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "id::string_or_number")]
    pub post_id: String,
    #[serde(default, alias = "authorId", deserialize_with = "id::string_or_number")]
    pub user_id: String,
    #[serde(default)]
    pub author: Option<Author>,
    pub content: String,
    #[serde(default, alias = "likes")]
    pub like_count: u64,
    #[serde(default, alias = "isLiked")]
    pub liked_by_me: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn pending(
        post_id: impl Into<String>,
        user_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("pending-{}", Uuid::new_v4()),
            post_id: post_id.into(),
            user_id: user_id.into(),
            author: None,
            content: content.into(),
            like_count: 0,
            liked_by_me: false,
            created_at: Some(Utc::now()),
        }
    }
}
