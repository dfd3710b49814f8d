//! Endpoint services - one per gateway resource.
//!
//! Reads accept `Option<&AccessToken>` and attach it when present. Writes
//! require `&AccessToken`, so an anonymous write cannot be expressed.

mod comments;
mod likes;
mod posts;
mod profiles;
mod users;

pub use comments::CommentService;
pub use likes::{LikeService, LikeTarget};
pub use posts::PostService;
pub use profiles::ProfileService;
pub use users::UserService;

use serde::Deserialize;

use babbly_core::domain::Page;

/// List bodies arrive either as a page object or, from older gateway
/// builds, as a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Items(Vec<T>),
    Page(Page<T>),
}

impl<T> From<Listing<T>> for Page<T> {
    fn from(listing: Listing<T>) -> Self {
        match listing {
            Listing::Items(items) => Page::new(items),
            Listing::Page(page) => page,
        }
    }
}
