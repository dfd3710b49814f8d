//! Client-side caching - keyed stale-while-revalidate store.

mod swr;

pub use swr::{CacheEvent, Fetcher, Snapshot, SwrCache, fetcher};
