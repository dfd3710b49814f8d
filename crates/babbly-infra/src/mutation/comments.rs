use babbly_core::domain::{AccessToken, Author, Comment, Page, Session};
use babbly_core::{ApiResult, validate_content};
use babbly_shared::dto::LikeResponse;

use super::listed::{find, prepend, remove, remove_from_list, replace, restore_removed, update};
use super::{InFlightSet, LikeOutcome, run_optimistic};
use crate::cache::SwrCache;
use crate::feed::{comments_resource, first_page_prefix, pages_prefix};
use crate::services::{CommentService, LikeService, LikeTarget};

/// Comment writes with the thread cache updated ahead of the gateway.
#[derive(Clone)]
pub struct CommentMutations {
    comments: CommentService,
    likes: LikeService,
    cache: SwrCache<Page<Comment>>,
    in_flight: InFlightSet,
}

impl CommentMutations {
    pub fn new(
        comments: CommentService,
        likes: LikeService,
        cache: SwrCache<Page<Comment>>,
        in_flight: InFlightSet,
    ) -> Self {
        Self {
            comments,
            likes,
            cache,
            in_flight,
        }
    }

    pub async fn create(&self, post_id: &str, content: &str, session: &Session) -> ApiResult<Comment> {
        let content = validate_content(content)?;

        let placeholder = Comment {
            author: Some(Author {
                username: Some(session.claims.username()),
                display_name: Some(session.claims.display_name()),
                picture: session.claims.picture.clone(),
            }),
            ..Comment::pending(post_id, &session.claims.sub, content)
        };
        let pending_id = placeholder.id.clone();
        let keys = self
            .cache
            .keys_with_prefix(&first_page_prefix(&comments_resource(post_id)))
            .await;

        let created = run_optimistic(
            &self.cache,
            keys,
            |page| Some(prepend(page, placeholder.clone())),
            self.comments.create(post_id, content, &session.token),
            |created: &Comment, page| replace(page, &pending_id, created.clone()),
            |_, page| remove(page, &pending_id),
        )
        .await?;

        self.revalidate_thread(post_id).await;
        Ok(created)
    }

    pub async fn update(
        &self,
        post_id: &str,
        id: &str,
        content: &str,
        token: &AccessToken,
    ) -> ApiResult<Comment> {
        let content = validate_content(content)?;
        let keys = self.thread_keys(post_id).await;

        run_optimistic(
            &self.cache,
            keys,
            |page| update(page, id, |comment| comment.content = content.to_string()),
            self.comments.update(id, content, token),
            |updated: &Comment, page| replace(page, id, updated.clone()),
            |before, page| {
                let original = find(before, id)?.content.clone();
                update(page, id, |comment| comment.content = original)
            },
        )
        .await
    }

    pub async fn delete(&self, post_id: &str, id: &str, token: &AccessToken) -> ApiResult<()> {
        let keys = self.thread_keys(post_id).await;

        run_optimistic(
            &self.cache,
            keys,
            |page| remove_from_list(page, id),
            self.comments.delete(id, token),
            |_, _| None,
            |before, page| restore_removed(before, page, id),
        )
        .await?;

        self.revalidate_thread(post_id).await;
        Ok(())
    }

    pub async fn set_liked(
        &self,
        post_id: &str,
        id: &str,
        liked: bool,
        token: &AccessToken,
    ) -> ApiResult<LikeOutcome> {
        let target = LikeTarget::Comment(id.to_string());
        let Some(_claim) = self.in_flight.try_acquire(target.to_string()) else {
            tracing::debug!(%target, "Like already in flight, skipping");
            return Ok(LikeOutcome::Skipped);
        };

        let delta: i64 = if liked { 1 } else { -1 };
        let keys = self.thread_keys(post_id).await;
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
                update(page, id, |comment| {
                    comment.like_count = comment.like_count.saturating_add_signed(delta);
                    comment.liked_by_me = liked;
                })
            },
            call,
            |response: &LikeResponse, page| {
                update(page, id, |comment| {
                    if let Some(likes) = response.likes {
                        comment.like_count = likes;
                    }
                })
            },
            |before, page| {
                let was_liked = find(before, id)?.liked_by_me;
                update(page, id, |comment| {
                    comment.like_count = comment.like_count.saturating_add_signed(-delta);
                    comment.liked_by_me = was_liked;
                })
            },
        )
        .await
        .map(LikeOutcome::Applied)
    }

    async fn revalidate_thread(&self, post_id: &str) {
        self.cache
            .revalidate_prefix(&pages_prefix(&comments_resource(post_id)))
            .await;
    }

    async fn thread_keys(&self, post_id: &str) -> Vec<String> {
        self.cache
            .keys_with_prefix(&pages_prefix(&comments_resource(post_id)))
            .await
    }
}
