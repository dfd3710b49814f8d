//! Domain records - plain data exchanged with the API Gateway.

mod comment;
mod page;
mod post;
mod session;
mod user;

pub(crate) mod id;

pub use comment::Comment;
pub use page::{DEFAULT_PAGE_SIZE, Page, PageRequest};
pub use post::{Author, Post};
pub use session::{AccessToken, IdentityClaims, Session};
pub use user::{ProfileState, PublicProfile, UserProfile};
