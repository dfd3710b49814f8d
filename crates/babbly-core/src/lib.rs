//! # Babbly Core
//!
//! The domain layer of the Babbly client.
//! Records exchanged with the API Gateway, the error taxonomy, content rules
//! and the ports the infrastructure crate implements. No I/O lives here.

pub mod domain;
pub mod error;
pub mod ports;
pub mod validation;

pub use error::{ApiError, ApiResult, ContentError, ErrorKind};
pub use validation::{MAX_CONTENT_CHARS, validate_content};
