use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id;
use super::page::Page;
use super::post::Post;
use super::session::IdentityClaims;

/// Application user record, owned by the gateway and keyed by the identity
/// subject id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(deserialize_with = "id::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub auth0_id: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default, alias = "fullName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// A user view built from identity claims alone, used when the gateway
    /// record could not be loaded.
    pub fn from_claims(claims: &IdentityClaims) -> Self {
        Self {
            id: claims.sub.clone(),
            auth0_id: Some(claims.sub.clone()),
            username: claims.username(),
            display_name: Some(claims.display_name()),
            first_name: claims.given_name.clone(),
            last_name: claims.family_name.clone(),
            bio: None,
            email: claims.email.clone(),
            picture: claims.picture.clone(),
            location: None,
            website: None,
            email_verified: claims.email_verified,
            created_at: None,
        }
    }
}

/// Public view of a user, as served by the profile endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    #[serde(flatten)]
    pub user: UserProfile,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub is_following: bool,
    #[serde(default, deserialize_with = "id::opt_string_or_number")]
    pub pinned_post_id: Option<String>,
    #[serde(default)]
    pub posts: Option<Page<Post>>,
}

/// Where the application user record stands for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProfileState {
    /// No identity session.
    #[default]
    Anonymous,
    /// The gateway record exists and matches the identity claims.
    Synced(UserProfile),
    /// Sync failed; the view is derived from the claims. The app stays usable.
    Provisional { profile: UserProfile, error: String },
}

impl ProfileState {
    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            ProfileState::Anonymous => None,
            ProfileState::Synced(profile) => Some(profile),
            ProfileState::Provisional { profile, .. } => Some(profile),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ProfileState::Provisional { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self, ProfileState::Synced(_))
    }
}
