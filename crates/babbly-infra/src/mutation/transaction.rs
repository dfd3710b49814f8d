//! Apply, call, then reconcile or undo, then revalidate.

use std::future::Future;
use std::sync::Arc;

use babbly_core::ApiResult;

use crate::cache::SwrCache;

/// An optimistic change spread over one or more cache keys.
///
/// Created with the local change already applied. Finish it with
/// [`commit`](Self::commit) once the gateway accepts the write, or
/// [`rollback`](Self::rollback) to revert it.
#[must_use = "an optimistic change must be committed or rolled back"]
pub struct Optimistic<V> {
    cache: SwrCache<V>,
    // Keys the change touched, with the value it was applied to.
    applied: Vec<(String, Arc<V>)>,
}

impl<V> Optimistic<V>
where
    V: Send + Sync + 'static,
{
    /// Apply `change` to every key that currently holds data. Keys without
    /// data, or where `change` returns `None`, are left alone.
    pub async fn apply<F>(cache: &SwrCache<V>, keys: Vec<String>, change: F) -> Self
    where
        F: Fn(&V) -> Option<V>,
    {
        let mut applied = Vec::with_capacity(keys.len());
        for key in keys {
            let mut touched = false;
            let before = cache
                .mutate(&key, |current| {
                    let next = current.and_then(&change);
                    touched = next.is_some();
                    next
                })
                .await;
            if let Some(before) = before.filter(|_| touched) {
                applied.push((key, before));
            }
        }
        Self {
            cache: cache.clone(),
            applied,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.applied.iter().map(|(k, _)| k.as_str())
    }

    /// Reconcile with the server's answer, then refetch in the background.
    pub async fn commit<F>(self, reconcile: F)
    where
        F: Fn(&V) -> Option<V>,
    {
        for (key, _) in &self.applied {
            self.cache
                .mutate(key, |current| current.and_then(&reconcile))
                .await;
            self.cache.revalidate(key).await;
        }
    }

    /// Revert this change only. `undo` gets the value the change was applied
    /// to and the current value, which may carry other writes made since,
    /// and returns the current value without this change. Each key is then
    /// refetched so the server has the last word.
    pub async fn rollback<U>(self, undo: U)
    where
        U: Fn(&V, &V) -> Option<V>,
    {
        for (key, before) in &self.applied {
            tracing::debug!(key = %key, "Rolling back optimistic change");
            self.cache
                .mutate(key, |current| current.and_then(|current| undo(&**before, current)))
                .await;
            self.cache.revalidate(key).await;
        }
    }
}

/// Run `call` with `change` applied optimistically. On success the cached
/// data is reconciled with the result; on failure `undo` reverts the change.
/// Either way the touched keys are revalidated.
pub async fn run_optimistic<V, R, Fut, A, C, U>(
    cache: &SwrCache<V>,
    keys: Vec<String>,
    change: A,
    call: Fut,
    reconcile: C,
    undo: U,
) -> ApiResult<R>
where
    V: Send + Sync + 'static,
    Fut: Future<Output = ApiResult<R>>,
    A: Fn(&V) -> Option<V>,
    C: Fn(&R, &V) -> Option<V>,
    U: Fn(&V, &V) -> Option<V>,
{
    let pending = Optimistic::apply(cache, keys, change).await;
    match call.await {
        Ok(result) => {
            pending.commit(|current| reconcile(&result, current)).await;
            Ok(result)
        }
        Err(e) => {
            tracing::warn!(error = %e, kind = ?e.kind, "Write rejected, reverting cached state");
            pending.rollback(undo).await;
            Err(e)
        }
    }
}
