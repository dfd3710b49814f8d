//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod transport;

pub use auth::{DecodedIdentity, IdentityTokenDecoder, LoginNavigator, TokenError};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, TransportError};
