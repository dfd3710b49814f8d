use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id;

const PENDING_PREFIX: &str = "pending-";

/// Author details the gateway embeds next to a post or comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, alias = "fullName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Post entity - a short message in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(deserialize_with = "id::string_or_number")]
    pub id: String,
    #[serde(default, alias = "authorId", deserialize_with = "id::string_or_number")]
    pub user_id: String,
    #[serde(default)]
    pub author: Option<Author>,
    pub content: String,
    #[serde(default, alias = "likes")]
    pub like_count: u64,
    #[serde(default, alias = "comments")]
    pub comment_count: u64,
    #[serde(default, alias = "isLiked")]
    pub liked_by_me: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Local placeholder shown at the head of the feed until the gateway
    /// confirms the create.
    pub fn pending(user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: format!("{PENDING_PREFIX}{}", Uuid::new_v4()),
            user_id: user_id.into(),
            author: None,
            content: content.into(),
            like_count: 0,
            comment_count: 0,
            liked_by_me: false,
            created_at: Some(Utc::now()),
            updated_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.id.starts_with(PENDING_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_gateway_shape() {
        let json = r#"{
            "id": 42,
            "userId": "auth0|abc",
            "content": "hello",
            "likes": 3,
            "commentCount": 1,
            "createdAt": "2024-05-01T10:00:00Z",
            "author": {"username": "ada", "fullName": "Ada L"}
        }"#;

        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.id, "42");
        assert_eq!(post.user_id, "auth0|abc");
        assert_eq!(post.like_count, 3);
        assert_eq!(post.comment_count, 1);
        assert!(!post.liked_by_me);
        assert_eq!(
            post.author.unwrap().display_name.as_deref(),
            Some("Ada L")
        );
    }

    #[test]
    fn test_pending_placeholder() {
        let post = Post::pending("u1", "draft");
        assert!(post.is_pending());
        assert_eq!(post.content, "draft");
        assert_eq!(post.like_count, 0);
    }
}
