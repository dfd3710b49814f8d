//! Optimistic writes.
//!
//! Every write validates locally, applies its effect to the cached lists,
//! calls the gateway, and then either reconciles with the answer or puts
//! the lists back as they were.

mod comments;
mod in_flight;
mod listed;
mod posts;
mod transaction;

pub use comments::CommentMutations;
pub use in_flight::{InFlightGuard, InFlightSet};
pub use listed::Listed;
pub use posts::PostMutations;
pub use transaction::{Optimistic, run_optimistic};

use babbly_shared::dto::LikeResponse;

/// Result of a like or unlike request.
#[derive(Debug, Clone)]
pub enum LikeOutcome {
    /// Sent; carries the gateway's counts.
    Applied(LikeResponse),
    /// Dropped because a like of the same target was already in flight.
    Skipped,
}

impl LikeOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, LikeOutcome::Skipped)
    }
}
