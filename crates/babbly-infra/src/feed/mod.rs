//! Feed and comment-thread lists.

mod keys;
mod paged;

pub use keys::{FEED_RESOURCE, comments_resource, first_page_prefix, page_key, pages_prefix};
pub use paged::{PageLoader, PagedList, page_loader};
