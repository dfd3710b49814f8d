//! Content rules shared by posts and comments.
//!
//! These mirror the gateway's own validation so obviously bad input never
//! leaves the client. The gateway stays authoritative.

use crate::error::ContentError;

/// Maximum length of a post or comment, in characters.
pub const MAX_CONTENT_CHARS: usize = 280;

/// Check that `content` is non-blank and at most [`MAX_CONTENT_CHARS`] long.
///
/// Length is counted in Unicode scalar values, not bytes. The content is
/// returned unchanged; surrounding whitespace is not stripped.
pub fn validate_content(content: &str) -> Result<&str, ContentError> {
    if content.trim().is_empty() {
        return Err(ContentError::Empty);
    }

    let len = content.chars().count();
    if len > MAX_CONTENT_CHARS {
        return Err(ContentError::TooLong {
            len,
            max: MAX_CONTENT_CHARS,
        });
    }

    Ok(content)
}
