//! Registers or refreshes the application user when a session starts.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;

use babbly_core::domain::{IdentityClaims, ProfileState, Session, UserProfile};
use babbly_core::{ApiResult, ErrorKind};
use babbly_shared::dto::{SyncProfileRequest, UpdateUserRequest};

use crate::services::UserService;

type SharedSync = Shared<BoxFuture<'static, ProfileState>>;

/// Keeps the gateway's user record in step with the identity claims.
///
/// Calls for the same subject while a sync is running join it, so two
/// callers can never both decide the record is missing and create it twice.
pub struct ProfileSynchronizer {
    users: UserService,
    running: Mutex<Option<(String, SharedSync)>>,
}

impl ProfileSynchronizer {
    pub fn new(users: UserService) -> Self {
        Self {
            users,
            running: Mutex::new(None),
        }
    }

    /// Never fails: when the record cannot be loaded or written the result
    /// is a provisional profile built from the claims.
    pub async fn sync(&self, session: &Session) -> ProfileState {
        let pending = {
            let mut running = self.running.lock().await;
            match running.as_ref() {
                Some((sub, pending)) if *sub == session.claims.sub => {
                    tracing::debug!(sub = %sub, "Joining running profile sync");
                    pending.clone()
                }
                _ => {
                    let users = self.users.clone();
                    let owned = session.clone();
                    let pending = async move { settle(&users, &owned).await }.boxed().shared();
                    *running = Some((session.claims.sub.clone(), pending.clone()));
                    pending
                }
            }
        };

        let state = pending.clone().await;

        let mut running = self.running.lock().await;
        if running
            .as_ref()
            .is_some_and(|(_, current)| current.ptr_eq(&pending))
        {
            *running = None;
        }
        state
    }
}

async fn settle(users: &UserService, session: &Session) -> ProfileState {
    match reconcile(users, session).await {
        Ok(profile) => {
            tracing::info!(user_id = %profile.id, username = %profile.username, "Profile synced");
            ProfileState::Synced(profile)
        }
        Err(e) => {
            tracing::warn!(
                sub = %session.claims.sub,
                kind = ?e.kind,
                error = %e,
                "Profile sync failed, continuing with identity claims"
            );
            ProfileState::Provisional {
                profile: UserProfile::from_claims(&session.claims),
                error: e.message,
            }
        }
    }
}

async fn reconcile(users: &UserService, session: &Session) -> ApiResult<UserProfile> {
    match users.me(&session.token).await {
        Ok(existing) => {
            let changes = changed_fields(&existing, &session.claims);
            if changes.is_empty() {
                return Ok(existing);
            }
            tracing::debug!(user_id = %existing.id, "Identity claims changed, updating profile");
            users.update_me(&changes, &session.token).await
        }
        Err(e) if e.kind == ErrorKind::NotFound => {
            tracing::info!(sub = %session.claims.sub, "No user record yet, creating one");
            users
                .create_profile(&registration(&session.claims), &session.token)
                .await
        }
        Err(e) => Err(e),
    }
}

fn registration(claims: &IdentityClaims) -> SyncProfileRequest {
    SyncProfileRequest {
        auth0_id: claims.sub.clone(),
        email: claims.email.clone(),
        full_name: claims.name.clone(),
        first_name: claims.given_name.clone(),
        last_name: claims.family_name.clone(),
        username: claims.username(),
        picture: claims.picture.clone(),
        email_verified: claims.email_verified,
    }
}

/// Fields the identity provider owns that drifted from the stored record.
/// The display name is user-editable, so it is only filled when missing.
fn changed_fields(existing: &UserProfile, claims: &IdentityClaims) -> UpdateUserRequest {
    fn differs(stored: &Option<String>, claimed: &Option<String>) -> Option<String> {
        claimed.clone().filter(|c| stored.as_ref() != Some(c))
    }

    UpdateUserRequest {
        email: differs(&existing.email, &claims.email),
        picture: differs(&existing.picture, &claims.picture),
        email_verified: (existing.email_verified != claims.email_verified)
            .then_some(claims.email_verified),
        display_name: existing
            .display_name
            .is_none()
            .then(|| claims.display_name()),
        ..Default::default()
    }
}
