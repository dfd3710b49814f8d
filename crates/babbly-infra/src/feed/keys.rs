//! Cache keys. A list page is keyed by its request path and query, so two
//! views asking for the same page share one entry.

use babbly_core::domain::PageRequest;

pub const FEED_RESOURCE: &str = "/api/posts";

pub fn comments_resource(post_id: &str) -> String {
    format!("/api/comments/post/{post_id}")
}

pub fn page_key(resource: &str, page: PageRequest) -> String {
    format!("{resource}?page={}&pageSize={}", page.page, page.page_size)
}

/// Prefix shared by every page of `resource` and nothing else.
pub fn pages_prefix(resource: &str) -> String {
    format!("{resource}?")
}

/// Prefix shared by the first page of `resource` at any page size.
pub fn first_page_prefix(resource: &str) -> String {
    format!("{resource}?page=1&")
}
