//! Data Transfer Objects - request/response bodies for the gateway API.

use serde::{Deserialize, Serialize};

/// POST /api/posts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
}

/// PUT /api/posts/:id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub content: String,
}

/// POST /api/comments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: String,
    pub content: String,
}

/// PUT /api/comments/:id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// POST/DELETE /api/likes - exactly one target is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<String>,
}

impl LikeRequest {
    pub fn post(id: impl Into<String>) -> Self {
        Self {
            post_id: Some(id.into()),
            comment_id: None,
        }
    }

    pub fn comment(id: impl Into<String>) -> Self {
        Self {
            post_id: None,
            comment_id: Some(id.into()),
        }
    }
}

/// Like state the gateway reports after a like or unlike.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    #[serde(default, alias = "likeCount")]
    pub likes: Option<u64>,
    #[serde(default, alias = "isLiked")]
    pub liked: Option<bool>,
}

/// POST /api/users/profile - registers or refreshes the application user
/// from identity-provider claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProfileRequest {
    pub auth0_id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: String,
    pub picture: Option<String>,
    pub email_verified: bool,
}

/// PUT /api/users/me - only the fields that are set change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// POST /api/auth/validate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub resource: String,
    pub action: String,
}

/// Anything but an explicit `true` means no.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    #[serde(default)]
    pub authorized: Option<bool>,
}

impl AuthorizationResponse {
    pub fn is_authorized(&self) -> bool {
        self.authorized == Some(true)
    }
}
