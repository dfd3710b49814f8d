//! Error bodies returned by the gateway.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Error body the gateway sends with non-2xx responses.
///
/// Covers both the plain `{"message": ...}` shape and RFC 7807 Problem
/// Details with a validation `errors` map.
/// See: https://datatracker.ietf.org/doc/html/rfc7807
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,

    /// A short, human-readable summary of the problem type.
    #[serde(default)]
    pub title: Option<String>,

    /// A human-readable explanation specific to this occurrence.
    #[serde(default)]
    pub detail: Option<String>,

    #[serde(default)]
    pub error: Option<String>,

    /// Field name to validation messages.
    #[serde(default)]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorResponse {
    /// Parse an error body. Non-JSON bodies yield `None`.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// The most specific non-blank message in the body, if any.
    pub fn display_message(&self) -> Option<String> {
        let first_field_error = self
            .errors
            .as_ref()
            .and_then(|errors| errors.values().flatten().find(|m| !m.trim().is_empty()));

        [
            self.message.as_ref(),
            first_field_error,
            self.detail.as_ref(),
            self.error.as_ref(),
            self.title.as_ref(),
        ]
        .into_iter()
        .flatten()
        .find(|m| !m.trim().is_empty())
        .cloned()
    }
}

/// Convenience: the display message of a raw body, if it has one.
pub fn server_message(body: &str) -> Option<String> {
    ErrorResponse::parse(body).and_then(|e| e.display_message())
}
