use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Targets with a write currently in flight.
///
/// A second write to the same target while the first is pending is
/// skipped rather than queued.
#[derive(Clone, Default)]
pub struct InFlightSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`. `None` when it is already claimed; the claim is
    /// released when the guard drops.
    pub fn try_acquire(&self, key: impl Into<String>) -> Option<InFlightGuard> {
        let key = key.into();
        let mut set = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            inner: self.inner.clone(),
            key,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

pub struct InFlightGuard {
    inner: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
