use serde::de::IgnoredAny;

use babbly_core::ApiResult;
use babbly_core::domain::{AccessToken, UserProfile};
use babbly_shared::dto::{
    AuthorizationRequest, AuthorizationResponse, SyncProfileRequest, UpdateUserRequest,
};

use crate::http::ApiClient;

/// The signed-in user's own record and social graph.
#[derive(Clone)]
pub struct UserService {
    client: ApiClient,
}

impl UserService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn me(&self, token: &AccessToken) -> ApiResult<UserProfile> {
        self.client.get("/api/users/me", Vec::new(), Some(token)).await
    }

    pub async fn update_me(&self, changes: &UpdateUserRequest, token: &AccessToken) -> ApiResult<UserProfile> {
        self.client.put("/api/users/me", changes, token).await
    }

    /// Register the application user from identity claims.
    pub async fn create_profile(
        &self,
        request: &SyncProfileRequest,
        token: &AccessToken,
    ) -> ApiResult<UserProfile> {
        self.client.post("/api/users/profile", request, token).await
    }

    /// Application record of any user, by username.
    pub async fn by_username(&self, username: &str, token: Option<&AccessToken>) -> ApiResult<UserProfile> {
        self.client
            .get(&format!("/api/users/username/{username}"), Vec::new(), token)
            .await
    }

    /// Ask the gateway whether the caller may perform `action` on `resource`.
    pub async fn authorize(&self, resource: &str, action: &str, token: &AccessToken) -> ApiResult<bool> {
        let request = AuthorizationRequest {
            resource: resource.to_string(),
            action: action.to_string(),
        };
        let response: AuthorizationResponse = self.client.post("/api/auth/validate", &request, token).await?;
        Ok(response.is_authorized())
    }

    pub async fn delete_account(&self, token: &AccessToken) -> ApiResult<()> {
        let _: IgnoredAny = self.client.delete("/api/users/me", token).await?;
        tracing::info!("Account deleted");
        Ok(())
    }

    pub async fn follow(&self, user_id: &str, token: &AccessToken) -> ApiResult<()> {
        let _: IgnoredAny = self
            .client
            .post(&format!("/api/users/follow/{user_id}"), &serde_json::json!({}), token)
            .await?;
        Ok(())
    }

    pub async fn unfollow(&self, user_id: &str, token: &AccessToken) -> ApiResult<()> {
        let _: IgnoredAny = self
            .client
            .delete(&format!("/api/users/follow/{user_id}"), token)
            .await?;
        Ok(())
    }
}
