//! Gateway access: transport, request wrapper and the login redirect gate.

mod client;
mod reauth;

#[cfg(feature = "http")]
mod transport;

pub use client::ApiClient;
pub use reauth::ReauthGate;

#[cfg(feature = "http")]
pub use transport::ReqwestTransport;
