//! Application context - one per signed-in client.
//!
//! Owns the session, the shared list caches and every service, and is the
//! single place that decides whether a write may go out.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{RwLock, broadcast};
use tokio_util::sync::CancellationToken;

use babbly_core::domain::{
    AccessToken, Comment, DEFAULT_PAGE_SIZE, Page, PageRequest, Post, ProfileState, PublicProfile,
    Session, UserProfile,
};
use babbly_core::ports::{HttpTransport, IdentityTokenDecoder, LoginNavigator, TokenError};
use babbly_core::{ApiError, ApiResult};
use babbly_shared::dto::UpdateUserRequest;

use crate::cache::{CacheEvent, SwrCache};
use crate::config::ClientConfig;
use crate::feed::{FEED_RESOURCE, PagedList, comments_resource, page_loader, pages_prefix};
use crate::http::{ApiClient, ReauthGate};
use crate::mutation::{CommentMutations, InFlightSet, LikeOutcome, PostMutations};
use crate::services::{CommentService, LikeService, PostService, ProfileService, UserService};
use crate::session::ProfileSynchronizer;

pub struct AppContext {
    config: ClientConfig,
    reauth: Arc<ReauthGate>,
    posts: PostService,
    comments: CommentService,
    users: UserService,
    profiles: ProfileService,
    post_cache: SwrCache<Page<Post>>,
    comment_cache: SwrCache<Page<Comment>>,
    post_writes: PostMutations,
    comment_writes: CommentMutations,
    synchronizer: ProfileSynchronizer,
    session: RwLock<Option<Session>>,
    profile: RwLock<ProfileState>,
    /// Parent of every view token; replaced when a session ends.
    views: RwLock<CancellationToken>,
    shutdown: CancellationToken,
}

impl AppContext {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        navigator: Arc<dyn LoginNavigator>,
    ) -> Self {
        let reauth = Arc::new(ReauthGate::new(navigator));
        let client = ApiClient::new(transport, reauth.clone());
        let shutdown = CancellationToken::new();

        let posts = PostService::new(client.clone());
        let comments = CommentService::new(client.clone());
        let likes = LikeService::new(client.clone());
        let users = UserService::new(client.clone());
        let profiles = ProfileService::new(client);

        let post_cache = SwrCache::new(config.cache.clone(), shutdown.child_token());
        let comment_cache = SwrCache::new(config.cache.clone(), shutdown.child_token());
        let in_flight = InFlightSet::new();

        Self {
            post_writes: PostMutations::new(
                posts.clone(),
                likes.clone(),
                post_cache.clone(),
                in_flight.clone(),
            ),
            comment_writes: CommentMutations::new(
                comments.clone(),
                likes,
                comment_cache.clone(),
                in_flight,
            ),
            synchronizer: ProfileSynchronizer::new(users.clone()),
            views: RwLock::new(shutdown.child_token()),
            session: RwLock::new(None),
            profile: RwLock::new(ProfileState::Anonymous),
            config,
            reauth,
            posts,
            comments,
            users,
            profiles,
            post_cache,
            comment_cache,
            shutdown,
        }
    }

    /// Context talking to the configured gateway over HTTPS.
    #[cfg(feature = "http")]
    pub fn connect(
        config: ClientConfig,
        navigator: Arc<dyn LoginNavigator>,
    ) -> Result<Self, babbly_core::ports::TransportError> {
        let transport = crate::http::ReqwestTransport::new(&config)?;
        Ok(Self::new(config, Arc::new(transport), navigator))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Adopt a new identity session and sync the user record.
    pub async fn establish_session(&self, session: Session) -> ProfileState {
        tracing::info!(sub = %session.claims.sub, "Session established");
        self.reauth.rearm();
        *self.session.write().await = Some(session.clone());

        let state = self.synchronizer.sync(&session).await;
        *self.profile.write().await = state.clone();
        state
    }

    /// Build a session from an ID token plus access token and adopt it.
    pub async fn establish_from_tokens(
        &self,
        decoder: &dyn IdentityTokenDecoder,
        id_token: &str,
        access_token: AccessToken,
    ) -> Result<ProfileState, TokenError> {
        let identity = decoder.decode(id_token)?;
        let session = Session::new(identity.claims, access_token).with_expiry(identity.expires_at);
        Ok(self.establish_session(session).await)
    }

    /// Drop the session: cancel every view, forget cached data.
    pub async fn end_session(&self) {
        {
            let mut views = self.views.write().await;
            views.cancel();
            *views = self.shutdown.child_token();
        }
        *self.session.write().await = None;
        *self.profile.write().await = ProfileState::Anonymous;
        self.post_cache.clear().await;
        self.comment_cache.clear().await;
        tracing::info!("Session ended");
    }

    /// Abort all background work. The context is unusable afterwards.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn profile(&self) -> ProfileState {
        self.profile.read().await.clone()
    }

    /// Token for reads; `None` reads anonymously.
    pub async fn read_token(&self) -> Option<AccessToken> {
        self.session
            .read()
            .await
            .as_ref()
            .filter(|s| !s.is_expired(Utc::now()))
            .map(|s| s.token.clone())
    }

    /// The live session a write needs. Without one the login redirect
    /// fires and nothing is sent.
    pub async fn require_session(&self) -> ApiResult<Session> {
        let session = self.session.read().await.clone();
        match session {
            Some(session) if !session.is_expired(Utc::now()) => Ok(session),
            Some(_) => {
                tracing::info!("Session expired");
                self.reauth.trigger();
                Err(ApiError::login_required())
            }
            None => {
                self.reauth.trigger();
                Err(ApiError::login_required())
            }
        }
    }

    pub async fn feed(&self) -> PagedList<Post> {
        self.feed_with_page_size(DEFAULT_PAGE_SIZE).await
    }

    pub async fn feed_with_page_size(&self, page_size: u32) -> PagedList<Post> {
        let posts = self.posts.clone();
        let token = self.read_token().await;
        let loader = page_loader(move |req| {
            let posts = posts.clone();
            let token = token.clone();
            async move { posts.list(req, token.as_ref()).await }
        });

        PagedList::new(
            self.post_cache.clone(),
            FEED_RESOURCE,
            page_size,
            loader,
            self.views.read().await.child_token(),
        )
    }

    pub async fn comments(&self, post_id: &str) -> PagedList<Comment> {
        let comments = self.comments.clone();
        let token = self.read_token().await;
        let owned_id = post_id.to_string();
        let loader = page_loader(move |req| {
            let comments = comments.clone();
            let token = token.clone();
            let post_id = owned_id.clone();
            async move { comments.list(&post_id, req, token.as_ref()).await }
        });

        PagedList::new(
            self.comment_cache.clone(),
            comments_resource(post_id),
            DEFAULT_PAGE_SIZE,
            loader,
            self.views.read().await.child_token(),
        )
    }

    /// Notifications for cached feed pages.
    pub fn feed_events(&self) -> broadcast::Receiver<CacheEvent> {
        self.post_cache.subscribe()
    }

    pub fn comment_events(&self) -> broadcast::Receiver<CacheEvent> {
        self.comment_cache.subscribe()
    }

    pub async fn post(&self, id: &str) -> ApiResult<Post> {
        let token = self.read_token().await;
        self.posts.get(id, token.as_ref()).await
    }

    pub async fn profile_by_username(&self, username: &str, posts: PageRequest) -> ApiResult<PublicProfile> {
        let token = self.read_token().await;
        self.profiles.by_username(username, posts, token.as_ref()).await
    }

    pub async fn profile_by_id(&self, user_id: &str, posts: PageRequest) -> ApiResult<PublicProfile> {
        let token = self.read_token().await;
        self.profiles.by_id(user_id, posts, token.as_ref()).await
    }

    pub async fn user_by_username(&self, username: &str) -> ApiResult<UserProfile> {
        let token = self.read_token().await;
        self.users.by_username(username, token.as_ref()).await
    }

    /// The signed-in user's public profile with a page of their posts.
    pub async fn my_profile(&self, posts: PageRequest) -> ApiResult<PublicProfile> {
        let session = self.require_session().await?;
        self.profiles.me(posts, &session.token).await
    }

    /// Whether the signed-in user may perform `action` on `resource`.
    /// Fails closed: no session, a refusal and an unanswered check are all
    /// `false`.
    pub async fn can(&self, resource: &str, action: &str) -> bool {
        let Ok(session) = self.require_session().await else {
            return false;
        };
        match self.users.authorize(resource, action, &session.token).await {
            Ok(authorized) => authorized,
            Err(e) => {
                tracing::warn!(resource, action, error = %e, "Authorization check failed, denying");
                false
            }
        }
    }

    pub async fn create_post(&self, content: &str) -> ApiResult<Post> {
        let session = self.require_session().await?;
        self.post_writes.create(content, &session).await
    }

    pub async fn update_post(&self, id: &str, content: &str) -> ApiResult<Post> {
        let session = self.require_session().await?;
        self.post_writes.update(id, content, &session.token).await
    }

    pub async fn delete_post(&self, id: &str) -> ApiResult<()> {
        let session = self.require_session().await?;
        self.post_writes.delete(id, &session.token).await?;
        self.comment_cache
            .invalidate_prefix(&comments_resource(id))
            .await;
        Ok(())
    }

    pub async fn set_post_liked(&self, id: &str, liked: bool) -> ApiResult<LikeOutcome> {
        let session = self.require_session().await?;
        self.post_writes.set_liked(id, liked, &session.token).await
    }

    pub async fn create_comment(&self, post_id: &str, content: &str) -> ApiResult<Comment> {
        let session = self.require_session().await?;
        let comment = self.comment_writes.create(post_id, content, &session).await?;
        self.post_cache.revalidate_prefix(&pages_prefix(FEED_RESOURCE)).await;
        Ok(comment)
    }

    pub async fn update_comment(&self, post_id: &str, id: &str, content: &str) -> ApiResult<Comment> {
        let session = self.require_session().await?;
        self.comment_writes
            .update(post_id, id, content, &session.token)
            .await
    }

    pub async fn delete_comment(&self, post_id: &str, id: &str) -> ApiResult<()> {
        let session = self.require_session().await?;
        self.comment_writes
            .delete(post_id, id, &session.token)
            .await?;
        self.post_cache.revalidate_prefix(&pages_prefix(FEED_RESOURCE)).await;
        Ok(())
    }

    pub async fn set_comment_liked(&self, post_id: &str, id: &str, liked: bool) -> ApiResult<LikeOutcome> {
        let session = self.require_session().await?;
        self.comment_writes
            .set_liked(post_id, id, liked, &session.token)
            .await
    }

    pub async fn update_profile(&self, changes: &UpdateUserRequest) -> ApiResult<UserProfile> {
        let session = self.require_session().await?;
        if changes.is_empty() {
            return match self.profile().await {
                ProfileState::Synced(profile) => Ok(profile),
                _ => self.users.me(&session.token).await,
            };
        }
        let updated = self.users.update_me(changes, &session.token).await?;
        *self.profile.write().await = ProfileState::Synced(updated.clone());
        Ok(updated)
    }

    pub async fn follow(&self, user_id: &str) -> ApiResult<()> {
        let session = self.require_session().await?;
        self.users.follow(user_id, &session.token).await
    }

    pub async fn unfollow(&self, user_id: &str) -> ApiResult<()> {
        let session = self.require_session().await?;
        self.users.unfollow(user_id, &session.token).await
    }

    /// Delete the account and end the session.
    pub async fn delete_account(&self) -> ApiResult<()> {
        let session = self.require_session().await?;
        self.users.delete_account(&session.token).await?;
        self.end_session().await;
        Ok(())
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
