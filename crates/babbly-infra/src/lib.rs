//! # Babbly Infrastructure
//!
//! Concrete implementations of the ports defined in `babbly-core`, and the
//! client engine built on them: the authenticated request wrapper, endpoint
//! services, the stale-while-revalidate cache, paged lists, optimistic
//! mutations and profile sync.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No network stack; bring your own `HttpTransport`
//! - `http` - reqwest transport for the API Gateway
//! - `jwt` - ID-token decoding via jsonwebtoken

pub mod cache;
pub mod config;
pub mod context;
pub mod feed;
pub mod http;
pub mod mutation;
pub mod services;
pub mod session;

#[cfg(feature = "jwt")]
pub mod auth;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheEvent, SwrCache};
pub use config::{CacheConfig, ClientConfig};
pub use context::AppContext;
pub use feed::PagedList;
pub use http::{ApiClient, ReauthGate};
pub use mutation::LikeOutcome;
pub use session::ProfileSynchronizer;

#[cfg(feature = "http")]
pub use http::ReqwestTransport;

#[cfg(feature = "jwt")]
pub use auth::JwtIdentityDecoder;
