use babbly_core::domain::{AccessToken, Author, Page, Post, Session};
use babbly_core::{ApiResult, validate_content};
use babbly_shared::dto::LikeResponse;

use super::listed::{find, prepend, remove, remove_from_list, replace, restore_removed, update};
use super::{InFlightSet, LikeOutcome, run_optimistic};
use crate::cache::SwrCache;
use crate::feed::{FEED_RESOURCE, first_page_prefix, pages_prefix};
use crate::services::{LikeService, LikeTarget, PostService};

/// Post writes with the feed cache updated ahead of the gateway.
#[derive(Clone)]
pub struct PostMutations {
    posts: PostService,
    likes: LikeService,
    cache: SwrCache<Page<Post>>,
    in_flight: InFlightSet,
}

impl PostMutations {
    pub fn new(
        posts: PostService,
        likes: LikeService,
        cache: SwrCache<Page<Post>>,
        in_flight: InFlightSet,
    ) -> Self {
        Self {
            posts,
            likes,
            cache,
            in_flight,
        }
    }

    /// Publish a post. A placeholder sits at the head of the feed until the
    /// gateway answers, then is swapped for the stored post.
    pub async fn create(&self, content: &str, session: &Session) -> ApiResult<Post> {
        let content = validate_content(content)?;

        let placeholder = Post {
            author: Some(Author {
                username: Some(session.claims.username()),
                display_name: Some(session.claims.display_name()),
                picture: session.claims.picture.clone(),
            }),
            ..Post::pending(&session.claims.sub, content)
        };
        let pending_id = placeholder.id.clone();
        let keys = self
            .cache
            .keys_with_prefix(&first_page_prefix(FEED_RESOURCE))
            .await;

        let created = run_optimistic(
            &self.cache,
            keys,
            |page| Some(prepend(page, placeholder.clone())),
            self.posts.create(content, &session.token),
            |created: &Post, page| replace(page, &pending_id, created.clone()),
            |_, page| remove(page, &pending_id),
        )
        .await?;

        // Later pages shift by one.
        self.revalidate_feed().await;
        tracing::info!(post_id = %created.id, "Post created");
        Ok(created)
    }

    pub async fn update(&self, id: &str, content: &str, token: &AccessToken) -> ApiResult<Post> {
        let content = validate_content(content)?;
        let keys = self.feed_keys().await;

        run_optimistic(
            &self.cache,
            keys,
            |page| update(page, id, |post| post.content = content.to_string()),
            self.posts.update(id, content, token),
            |updated: &Post, page| replace(page, id, updated.clone()),
            |before, page| {
                let original = find(before, id)?.content.clone();
                update(page, id, |post| post.content = original)
            },
        )
        .await
    }

    pub async fn delete(&self, id: &str, token: &AccessToken) -> ApiResult<()> {
        let keys = self.feed_keys().await;

        run_optimistic(
            &self.cache,
            keys,
            |page| remove_from_list(page, id),
            self.posts.delete(id, token),
            |_, _| None,
            |before, page| restore_removed(before, page, id),
        )
        .await?;

        self.revalidate_feed().await;
        Ok(())
    }

    /// Like or unlike. Skipped while an earlier like of the same post is
    /// still in flight.
    pub async fn set_liked(&self, id: &str, liked: bool, token: &AccessToken) -> ApiResult<LikeOutcome> {
        let target = LikeTarget::Post(id.to_string());
        let Some(_claim) = self.in_flight.try_acquire(target.to_string()) else {
            tracing::debug!(%target, "Like already in flight, skipping");
            return Ok(LikeOutcome::Skipped);
        };

        let delta: i64 = if liked { 1 } else { -1 };
        let keys = self.feed_keys().await;
        let call = async {
            if liked {
                self.likes.like(&target, token).await
            } else {
                self.likes.unlike(&target, token).await
            }
        };

        run_optimistic(
            &self.cache,
            keys,
            |page| {
                update(page, id, |post| {
                    post.like_count = post.like_count.saturating_add_signed(delta);
                    post.liked_by_me = liked;
                })
            },
            call,
            |response: &LikeResponse, page| {
                update(page, id, |post| {
                    if let Some(likes) = response.likes {
                        post.like_count = likes;
                    }
                    if let Some(liked) = response.liked {
                        post.liked_by_me = liked;
                    }
                })
            },
            |before, page| {
                let was_liked = find(before, id)?.liked_by_me;
                update(page, id, |post| {
                    post.like_count = post.like_count.saturating_add_signed(-delta);
                    post.liked_by_me = was_liked;
                })
            },
        )
        .await
        .map(LikeOutcome::Applied)
    }

    async fn revalidate_feed(&self) {
        self.cache.revalidate_prefix(&pages_prefix(FEED_RESOURCE)).await;
    }

    async fn feed_keys(&self) -> Vec<String> {
        self.cache.keys_with_prefix(&pages_prefix(FEED_RESOURCE)).await
    }
}
