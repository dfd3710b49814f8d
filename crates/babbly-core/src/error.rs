//! Client-level error types.

use thiserror::Error;

/// Broad classes of failure a caller reacts to differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or rejected credentials. The caller starts the login flow.
    AuthenticationRequired,
    /// Ownership or permission failure on a mutating call.
    AuthorizationDenied,
    /// Content constraints violated, client- or server-side.
    ValidationFailed,
    NotFound,
    RateLimited,
    ServerError,
    /// The request never got a response.
    NetworkUnreachable,
    /// A status the gateway is not documented to return.
    Unexpected,
    /// A 2xx response whose body did not match the expected shape.
    InvalidResponse,
    /// The waiter was cancelled before the result arrived.
    Cancelled,
}

/// Uniform error value for every gateway call.
///
/// Carries the HTTP status when there was one and a message that is ready to
/// show to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

const GENERIC_MESSAGE: &str = "An unexpected error occurred";

impl ApiError {
    pub fn new(kind: ErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    /// Translate a non-2xx status into an error.
    ///
    /// `server_message` is the `message` field of the response body, if any.
    /// It is passed through for 400s and for statuses without a canned text.
    pub fn from_status(status: u16, server_message: Option<String>) -> Self {
        let fallback = || format!("Error {status}: Something went wrong");

        let (kind, message) = match status {
            400 => (
                ErrorKind::ValidationFailed,
                server_message.unwrap_or_else(|| "Invalid request".to_string()),
            ),
            401 => (
                ErrorKind::AuthenticationRequired,
                "You need to log in again".to_string(),
            ),
            403 => (
                ErrorKind::AuthorizationDenied,
                "You do not have permission to access this resource".to_string(),
            ),
            404 => (
                ErrorKind::NotFound,
                "The requested resource was not found".to_string(),
            ),
            429 => (
                ErrorKind::RateLimited,
                "Too many requests. Please try again later".to_string(),
            ),
            500 => (
                ErrorKind::ServerError,
                "Server error. Please try again later".to_string(),
            ),
            501..=599 => (
                ErrorKind::ServerError,
                server_message.unwrap_or_else(fallback),
            ),
            _ => (
                ErrorKind::Unexpected,
                server_message.unwrap_or_else(fallback),
            ),
        };

        Self::new(kind, Some(status), message)
    }

    /// No response was received.
    pub fn unreachable() -> Self {
        Self::new(
            ErrorKind::NetworkUnreachable,
            None,
            "No response from server. Please check your connection",
        )
    }

    /// A write was attempted without an identity session.
    pub fn login_required() -> Self {
        Self::new(
            ErrorKind::AuthenticationRequired,
            None,
            "Please log in to continue",
        )
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, None, "Request was cancelled")
    }

    pub fn invalid_response(detail: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::InvalidResponse,
            None,
            format!("{GENERIC_MESSAGE}: {detail}"),
        )
    }

    /// The caller should start the identity provider's login flow.
    pub fn requires_login(&self) -> bool {
        self.kind == ErrorKind::AuthenticationRequired
    }

    /// Worth showing a retry affordance or retrying automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NetworkUnreachable | ErrorKind::RateLimited | ErrorKind::ServerError
        )
    }

    /// Rendered next to the form that caused it.
    pub fn is_inline(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ValidationFailed | ErrorKind::AuthorizationDenied
        )
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        Self::new(ErrorKind::ValidationFailed, None, err.to_string())
    }
}

/// Post and comment text rule violations, checked before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("Content cannot be empty")]
    Empty,

    #[error("Content cannot exceed {max} characters ({len} given)")]
    TooLong { len: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        let cases = [
            (401, ErrorKind::AuthenticationRequired, "You need to log in again"),
            (
                403,
                ErrorKind::AuthorizationDenied,
                "You do not have permission to access this resource",
            ),
            (404, ErrorKind::NotFound, "The requested resource was not found"),
            (429, ErrorKind::RateLimited, "Too many requests. Please try again later"),
            (500, ErrorKind::ServerError, "Server error. Please try again later"),
        ];

        for (status, kind, message) in cases {
            let err = ApiError::from_status(status, Some("ignored".to_string()));
            assert_eq!(err.kind, kind);
            assert_eq!(err.status, Some(status));
            assert_eq!(err.message, message);
        }
    }

    #[test]
    fn test_validation_message_passes_through() {
        let err = ApiError::from_status(400, Some("Post content cannot exceed 280".to_string()));
        assert_eq!(err.kind, ErrorKind::ValidationFailed);
        assert_eq!(err.to_string(), "Post content cannot exceed 280");

        let err = ApiError::from_status(400, None);
        assert_eq!(err.message, "Invalid request");
    }

    #[test]
    fn test_unlisted_status_falls_back() {
        let err = ApiError::from_status(418, None);
        assert_eq!(err.kind, ErrorKind::Unexpected);
        assert_eq!(err.message, "Error 418: Something went wrong");

        let err = ApiError::from_status(503, Some("Maintenance".to_string()));
        assert_eq!(err.kind, ErrorKind::ServerError);
        assert_eq!(err.message, "Maintenance");
    }

    #[test]
    fn test_classification() {
        assert!(ApiError::from_status(401, None).requires_login());
        assert!(ApiError::login_required().requires_login());
        assert!(ApiError::unreachable().is_retryable());
        assert!(ApiError::from_status(403, None).is_inline());
        assert!(!ApiError::from_status(404, None).is_retryable());
    }
}
