use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims the identity provider asserts about the signed-in user.
///
/// Field names follow OpenID Connect so an ID token payload deserializes
/// directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Identity-provider subject id, e.g. `auth0|65f...`.
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}

impl IdentityClaims {
    fn email_local_part(&self) -> Option<&str> {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
    }

    /// Handle proposed for a new application user: the nickname, else the
    /// local part of the email.
    pub fn username(&self) -> String {
        self.nickname
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.email_local_part())
            .unwrap_or(&self.sub)
            .to_string()
    }

    pub fn display_name(&self) -> String {
        self.nickname
            .as_deref()
            .or(self.name.as_deref())
            .or_else(|| self.email_local_part())
            .unwrap_or("User")
            .to_string()
    }
}

/// Bearer credential for the API Gateway.
///
/// `Debug` never prints the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// An established identity session: who the user is plus the token to act
/// as them.
#[derive(Debug, Clone)]
pub struct Session {
    pub claims: IdentityClaims,
    pub token: AccessToken,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(claims: IdentityClaims, token: AccessToken) -> Self {
        Self {
            claims,
            token,
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}
