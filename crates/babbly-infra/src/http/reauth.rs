//! One-shot login redirect.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use babbly_core::ports::LoginNavigator;

/// Fires the login redirect at most once per session.
///
/// Any number of calls may fail with 401 at the same time; only the first
/// one reaches the navigator. The gate re-arms when a new session is
/// established.
pub struct ReauthGate {
    navigator: Arc<dyn LoginNavigator>,
    fired: AtomicBool,
}

impl ReauthGate {
    pub fn new(navigator: Arc<dyn LoginNavigator>) -> Self {
        Self {
            navigator,
            fired: AtomicBool::new(false),
        }
    }

    /// Start the login flow unless it is already under way.
    /// Returns true when this call issued the redirect.
    pub fn trigger(&self) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Login redirect already issued");
            return false;
        }

        tracing::info!("Authentication required - redirecting to login");
        self.navigator.redirect_to_login();
        true
    }

    pub fn rearm(&self) {
        self.fired.store(false, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}
