//! # Babbly Shared
//!
//! Wire types exchanged with the API Gateway: request bodies and the error
//! body the gateway returns on failure.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
