//! Identity-provider ports.

use chrono::{DateTime, Utc};

use crate::domain::IdentityClaims;

/// Starts the identity provider's hosted login flow.
///
/// Implementations perform a full redirect (or the closest equivalent for
/// their front end). They are never used for silent retries.
pub trait LoginNavigator: Send + Sync {
    /// Send the user to the login page.
    fn redirect_to_login(&self);
}

/// Claims read from an identity token, plus its expiry.
#[derive(Debug, Clone)]
pub struct DecodedIdentity {
    pub claims: IdentityClaims,
    pub expires_at: DateTime<Utc>,
}

/// Reads the user's claims out of an identity-provider ID token.
pub trait IdentityTokenDecoder: Send + Sync {
    fn decode(&self, id_token: &str) -> Result<DecodedIdentity, TokenError>;
}

/// Identity token errors.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Unexpected issuer: {0}")]
    WrongIssuer(String),
}
